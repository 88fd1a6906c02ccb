//! Module containing the site builder.

use std::path::PathBuf;

use eyre::{eyre, WrapErr};
use handlebars::Handlebars;
use pulldown_cmark::{Options, Parser};
use serde::Serialize;

use crate::{
	frontmatter::FrontMatter, helpers, paths, util, PageMetadata, Site, SiteConfig, ThemeConfig,
};

/// Struct containing data to be sent to templates when rendering them.
#[derive(Debug, Serialize)]
struct TemplateData<'a> {
	/// The site's configuration.
	pub config: &'a SiteConfig,
	/// The theme's configuration.
	pub theme: &'a ThemeConfig,
	/// The site's languages.
	pub languages: &'a [String],
	/// The page being rendered.
	pub page: PageData<'a>,
	/// The page's full URL.
	pub url: String,
}

/// The page fields templates and helpers read.
#[derive(Debug, Serialize)]
struct PageData<'a> {
	pub title: Option<&'a str>,
	/// The page's output path, relative to the site root.
	pub path: String,
	pub lang: String,
	pub cover: Option<&'a str>,
	pub photos: &'a [String],
	/// The rendered page.
	pub content: &'a str,
}

/// Struct used to build the site.
pub struct SiteBuilder<'a> {
	/// The Handlebars registry used to render templates.
	pub(crate) reg: Handlebars<'a>,
	/// The site info used to build the site.
	pub site: Site,
	/// The path to the build directory.
	pub build_path: PathBuf,
}

impl<'a> SiteBuilder<'a> {
	/// Creates a new site builder.
	pub fn new(site: Site) -> Self {
		let build_path = match &site.config.build {
			Some(build) => site.site_path.join(build),
			_ => site.site_path.join("build"),
		};

		Self {
			reg: Handlebars::new(),
			site,
			build_path,
		}
	}

	/// Prepares the site builder for use and sets up the build directory.
	pub fn prepare(mut self) -> eyre::Result<Self> {
		if self.build_path.exists() {
			util::remove_dir_contents(&self.build_path)
				.wrap_err("Failed to remove old contents of build directory")?;
		} else {
			std::fs::create_dir_all(&self.build_path)
				.wrap_err("Failed to create build directory")?;
		}

		for (template_name, template_path) in &self.site.template_index {
			self.reg
				.register_template_file(template_name, template_path)
				.wrap_err_with(|| format!("Failed to register template {template_name}"))?;
		}

		helpers::register_helpers(
			&mut self.reg,
			self.site.config.clone(),
			self.site.i18n.clone(),
		);

		Ok(self)
	}

	/// Gets a page's language from its front matter, or from its first path segment.
	fn page_language(&self, page_name: &str, page_metadata: &PageMetadata) -> String {
		if let Some(lang) = &page_metadata.lang {
			return lang.clone();
		}
		let config = &self.site.config;
		page_name
			.split_once('/')
			.map(|(first, _)| first)
			.filter(|first| config.language.iter().any(|language| language.as_str() == *first))
			.or_else(|| config.default_language())
			.unwrap_or_default()
			.to_string()
	}

	/// Helper to render a page without writing it to disk.
	pub fn build_page_raw(
		&self,
		page_name: &str,
		page_metadata: &PageMetadata,
		page_html: &str,
	) -> eyre::Result<String> {
		let config = &self.site.config;
		let path = format!("{page_name}.html");
		let data = TemplateData {
			config,
			theme: &config.theme,
			languages: &config.language,
			url: paths::full_url_for(config, &path),
			page: PageData {
				title: page_metadata.title.as_deref(),
				lang: self.page_language(page_name, page_metadata),
				path,
				cover: page_metadata.cover.as_deref(),
				photos: &page_metadata.photos,
				content: page_html,
			},
		};

		let template = page_metadata.template.as_deref().unwrap_or("base");
		self.reg
			.render(template, &data)
			.wrap_err_with(|| format!("Failed to render template {template} for page {page_name}"))
	}

	/// Builds a standard page.
	pub fn build_page(&self, page_name: &str) -> eyre::Result<()> {
		let page_path = self
			.site
			.page_index
			.get(page_name)
			.ok_or_else(|| eyre!("Missing page {page_name}"))?;

		let input = std::fs::read_to_string(page_path)
			.wrap_err_with(|| format!("Failed to read page at {}", page_path.display()))?;
		let page = FrontMatter::<PageMetadata>::parse(input)
			.wrap_err_with(|| format!("Failed to parse front matter of page {page_name}"))?;
		let page_metadata = page.data.unwrap_or_default();

		let parser = Parser::new_ext(&page.content, Options::all());
		let mut page_html = String::new();
		pulldown_cmark::html::push_html(&mut page_html, parser);

		let out = self.build_page_raw(page_name, &page_metadata, &page_html)?;

		let out_path = self.build_path.join(format!("{page_name}.html"));
		if let Some(parent) = out_path.parent() {
			std::fs::create_dir_all(parent)
				.wrap_err_with(|| format!("Failed to create directory for page {page_name}"))?;
		}
		std::fs::write(&out_path, out).wrap_err_with(|| {
			format!(
				"Failed to create HTML file at {} for page {}",
				out_path.display(),
				page_name
			)
		})?;
		tracing::info!(page = page_name, "built page");

		Ok(())
	}
}
