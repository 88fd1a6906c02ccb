mod builder;
mod frontmatter;
pub mod helpers;
pub mod i18n;
pub mod images;
pub mod link;
pub mod paths;
mod util;

use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	sync::Arc,
};

use eyre::WrapErr;
use serde::{Deserialize, Deserializer, Serialize};
use util::get_name;
use walkdir::WalkDir;

use builder::SiteBuilder;
use i18n::I18n;

const PAGES_PATH: &str = "pages";
const TEMPLATES_PATH: &str = "templates";
const LANGUAGES_PATH: &str = "languages";

/// Struct for the site's configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
	/// The site's title.
	#[serde(default)]
	pub title: String,
	/// The public URL of the site, including any subdirectory it is served from.
	pub url: String,
	/// The path the site is served under.
	#[serde(default = "SiteConfig::default_root")]
	pub root: String,
	/// The permalink pattern for posts.
	#[serde(default = "SiteConfig::default_permalink")]
	pub permalink: String,
	/// Controls trailing `index.html` and `.html` in generated URLs.
	#[serde(default)]
	pub pretty_urls: PrettyUrls,
	/// The site's languages. The first one is the default language.
	#[serde(default, deserialize_with = "deserialize_languages")]
	pub language: Vec<String>,
	/// Whether each post has its own asset folder.
	#[serde(default)]
	pub post_asset_folder: bool,
	/// The site's build directory. Defaults to <site>/build if not specified.
	pub build: Option<String>,
	/// The theme's configuration.
	#[serde(default)]
	pub theme: ThemeConfig,
}

impl SiteConfig {
	fn default_root() -> String {
		"/".to_string()
	}

	fn default_permalink() -> String {
		":year/:month/:day/:title/".to_string()
	}

	/// Parses a site configuration from YAML.
	pub fn from_yaml(input: &str) -> eyre::Result<Self> {
		serde_yml::from_str(input).wrap_err("Failed to parse site config")
	}

	/// Resolves a site-relative path to a URL under the site's root.
	pub fn url_for(&self, path: &str) -> String {
		paths::url_for(self, path)
	}

	/// Gets the site's default language, if any languages are configured.
	pub fn default_language(&self) -> Option<&str> {
		self.language.first().map(String::as_str)
	}

	/// Whether the given language is the site's default language.
	pub fn is_default_language(&self, language: &str) -> bool {
		self.default_language() == Some(language)
	}
}

/// Pretty URL options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrettyUrls {
	/// Keep a trailing `index.html` in URLs.
	pub trailing_index: bool,
	/// Keep a trailing `.html` in URLs.
	pub trailing_html: bool,
}

impl Default for PrettyUrls {
	fn default() -> Self {
		Self {
			trailing_index: true,
			trailing_html: true,
		}
	}
}

/// Struct for the theme's configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeConfig {
	/// Render external links as spans with an encoded target.
	pub exturl: bool,
	/// Pool of cover and background images, relative to the covers directory.
	pub image_list: Vec<String>,
	/// Prefix for item-owned images.
	pub statics: String,
}

impl Default for ThemeConfig {
	fn default() -> Self {
		Self {
			exturl: false,
			image_list: Vec::new(),
			statics: "/".to_string(),
		}
	}
}

/// Accepts either a single language or a list of them. `default` is not a real language.
fn deserialize_languages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Languages {
		One(String),
		Many(Vec<String>),
	}

	let languages = match Option::<Languages>::deserialize(deserializer)? {
		Some(Languages::One(language)) => vec![language],
		Some(Languages::Many(languages)) => languages,
		None => Vec::new(),
	};
	Ok(languages
		.into_iter()
		.filter(|language| language != "default")
		.collect())
}

/// Struct for the front matter in pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageMetadata {
	/// The page's title.
	pub title: Option<String>,
	/// The template to use for the page. If not specified, it defaults to "base".
	pub template: Option<String>,
	/// The page's language. Inferred from the page's path if not specified.
	pub lang: Option<String>,
	/// The page's cover image.
	pub cover: Option<String>,
	/// The page's photos, if any.
	#[serde(default)]
	pub photos: Vec<String>,
}

/// Struct containing information about the site.
#[derive(Debug)]
pub struct Site {
	/// The path to the site.
	pub site_path: PathBuf,
	/// The site's configuration.
	pub config: Arc<SiteConfig>,
	/// The site's translation tables.
	pub i18n: Arc<I18n>,
	/// An index of available templates.
	pub template_index: HashMap<String, PathBuf>,
	/// An index of available pages.
	pub page_index: HashMap<String, PathBuf>,
}

impl Site {
	/// Creates a new site from the given path.
	pub fn new(site_path: &Path) -> eyre::Result<Self> {
		let config = SiteConfig::from_yaml(
			&std::fs::read_to_string(site_path.join("config.yaml"))
				.wrap_err("Failed to read site config")?,
		)?;

		let template_index = index_files(&site_path.join(TEMPLATES_PATH), "hbs")
			.wrap_err("Failed to index templates")?;
		let page_index =
			index_files(&site_path.join(PAGES_PATH), "md").wrap_err("Failed to index pages")?;
		let i18n = I18n::load(&site_path.join(LANGUAGES_PATH))?;

		tracing::debug!(
			templates = template_index.len(),
			pages = page_index.len(),
			"loaded site"
		);

		Ok(Self {
			site_path: site_path.to_owned(),
			config: Arc::new(config),
			i18n: Arc::new(i18n),
			template_index,
			page_index,
		})
	}

	/// Builds the site once.
	pub fn build_once(self) -> eyre::Result<()> {
		let builder = SiteBuilder::new(self).prepare()?;

		builder.site.build_all_pages(&builder)?;

		Ok(())
	}

	/// Helper method to build all available pages.
	fn build_all_pages(&self, builder: &SiteBuilder) -> eyre::Result<()> {
		for page_name in self.page_index.keys() {
			builder.build_page(page_name)?;
		}

		Ok(())
	}
}

/// Indexes every file with the given extension below `root` by its extensionless name.
fn index_files(root: &Path, extension: &str) -> eyre::Result<HashMap<String, PathBuf>> {
	let mut index = HashMap::new();
	if !root.exists() {
		tracing::warn!(path = ?root, "directory does not exist, nothing to index");
		return Ok(index);
	}

	for entry in WalkDir::new(root).into_iter() {
		let entry = entry.wrap_err("Failed to read directory entry")?;
		let path = entry.path();

		if path.extension().is_some_and(|ext| ext == extension) && entry.file_type().is_file() {
			let (_, name) = get_name(
				path.strip_prefix(root)
					.wrap_err("This really shouldn't have happened")?,
			);
			index.insert(name, path.to_owned());
		}
	}

	Ok(index)
}
