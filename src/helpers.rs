//! Module containing the theme's Handlebars helpers.
//!
//! | Helper | Usage |
//! |--------|-------|
//! | `_url` | `{{_url path text class="..."}}` |
//! | `_image_url` | `{{_image_url img page.path}}` |
//! | `_cover` | `{{_cover page}}`, `{{#each (_cover page 3)}}` |
//! | `random_bg` | `{{#each (random_bg 3)}}`, `{{random_bg 1 list}}` |
//! | `_md5` | `{{_md5 page.path}}` |
//! | `_permapath` | `{{_permapath url}}` |
//! | `canonical` | `{{canonical}}` |
//! | `i18n_path` | `{{i18n_path "ja"}}` |
//! | `language_name` | `{{language_name "ja"}}` |

use std::sync::Arc;

use handlebars::{
	Context, Handlebars, Helper, HelperDef, HelperResult, JsonValue, Output, RenderContext,
	RenderError, RenderErrorReason, ScopedJson,
};

use crate::{
	i18n::I18n,
	images::{CoverItem, ImageSampler, ThreadRandom},
	link::{AttrValue, Attributes, LinkResolver},
	paths, SiteConfig,
};

/// Registers every theme helper on the given registry.
pub fn register_helpers(reg: &mut Handlebars<'_>, config: Arc<SiteConfig>, i18n: Arc<I18n>) {
	reg.register_helper("_url", Box::new(LinkHelper(config.clone())));
	reg.register_helper("_image_url", Box::new(ImageUrlHelper(config.clone())));
	reg.register_helper("_cover", Box::new(CoverHelper(config.clone())));
	reg.register_helper("random_bg", Box::new(RandomBgHelper(config.clone())));
	reg.register_helper("_md5", Box::new(Md5Helper(config.clone())));
	reg.register_helper("_permapath", Box::new(PermapathHelper(config.clone())));
	reg.register_helper("canonical", Box::new(CanonicalHelper(config.clone())));
	reg.register_helper("i18n_path", Box::new(I18nPathHelper(config)));
	reg.register_helper("language_name", Box::new(LanguageNameHelper(i18n)));
}

fn param<'a>(h: &'a Helper<'_>, index: usize) -> Option<&'a JsonValue> {
	h.param(index)
		.map(|param| param.value())
		.filter(|value| !value.is_null())
}

/// Gets a required string parameter.
fn str_param<'a>(h: &'a Helper<'_>, index: usize) -> Result<&'a str, RenderError> {
	match param(h, index) {
		Some(JsonValue::String(value)) => Ok(value.as_str()),
		Some(other) => Err(RenderErrorReason::Other(format!(
			"{}: parameter {index} must be a string, got {other}",
			h.name()
		))
		.into()),
		None => Err(RenderErrorReason::Other(format!(
			"{}: missing parameter {index}",
			h.name()
		))
		.into()),
	}
}

/// Reads an image count. Anything that isn't a positive number counts as one.
fn count_param(h: &Helper<'_>, index: usize) -> usize {
	match param(h, index) {
		Some(JsonValue::Number(number)) => number
			.as_u64()
			.map(|n| n as usize)
			.or_else(|| number.as_f64().filter(|n| *n >= 1.0).map(|n| n as usize))
			.unwrap_or(1),
		Some(JsonValue::String(text)) => text.trim().parse().unwrap_or(1),
		_ => 1,
	}
}

/// Turns a template value into an attribute value. `null` and `false` remove the attribute.
fn attr_value(value: &JsonValue) -> AttrValue {
	match value {
		JsonValue::Null | JsonValue::Bool(false) => AttrValue::Absent,
		JsonValue::Bool(true) => AttrValue::Flag,
		JsonValue::String(text) => AttrValue::text(text.as_str()),
		JsonValue::Array(items) => AttrValue::List(items.iter().map(json_text).collect()),
		other => AttrValue::Text(other.to_string()),
	}
}

/// A JSON value as plain text, without the quotes around strings.
fn json_text(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn derived<'rc>(value: impl Into<JsonValue>) -> Result<ScopedJson<'rc>, RenderError> {
	Ok(ScopedJson::Derived(value.into()))
}

/// `{{_url path text}}`: renders a link, or nothing when `path` is empty.
///
/// Options come from an object given as the third parameter and from hash arguments, in that order.
pub struct LinkHelper(Arc<SiteConfig>);

impl HelperDef for LinkHelper {
	fn call<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
		out: &mut dyn Output,
	) -> HelperResult {
		let target = match param(h, 0) {
			None => return Ok(()),
			Some(JsonValue::String(target)) => target.as_str(),
			Some(other) => {
				return Err(RenderErrorReason::Other(format!(
					"_url: link target must be a string, got {other}"
				))
				.into())
			}
		};
		let text = match param(h, 1) {
			Some(text) => json_text(text),
			None => target.to_string(),
		};

		let mut options = Attributes::new();
		if let Some(JsonValue::Object(object)) = param(h, 2) {
			for (name, value) in object {
				options.set(name.as_str(), attr_value(value));
			}
		}
		for (name, value) in h.hash() {
			options.set(*name, attr_value(value.value()));
		}

		if let Some(tag) = LinkResolver::new(&self.0).resolve(target, &text, &options) {
			out.write(&tag.to_string())?;
		}

		Ok(())
	}
}

/// `{{_image_url img path}}`: URL of an item-owned image.
pub struct ImageUrlHelper(Arc<SiteConfig>);

impl HelperDef for ImageUrlHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		let img = str_param(h, 0)?;
		let path = param(h, 1).and_then(JsonValue::as_str).unwrap_or_default();
		derived(ImageSampler::new(&self.0).image_url(img, path))
	}
}

/// `{{_cover item count}}`: the item's cover, or covers drawn from the theme's pool.
pub struct CoverHelper(Arc<SiteConfig>);

impl HelperDef for CoverHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		let item = param(h, 0).map(cover_item).unwrap_or_default();
		let count = count_param(h, 1);

		let sample = ImageSampler::new(&self.0).cover(&item, count, &mut ThreadRandom::default());
		derived(
			serde_json::to_value(sample)
				.map_err(|err| RenderErrorReason::Other(format!("_cover: {err}")))?,
		)
	}
}

/// Reads the cover fields of an item. Fields that aren't strings count as missing.
fn cover_item(value: &JsonValue) -> CoverItem {
	let text = |name: &str| value.get(name).and_then(JsonValue::as_str).map(str::to_owned);
	let photos = value
		.get("photos")
		.and_then(JsonValue::as_array)
		.filter(|photos| photos.first().is_some_and(JsonValue::is_string))
		.map(|photos| {
			photos
				.iter()
				.filter_map(JsonValue::as_str)
				.map(str::to_owned)
				.collect()
		});

	CoverItem {
		cover: text("cover"),
		photos,
		path: text("path").unwrap_or_default(),
	}
}

/// `{{random_bg count list}}`: background images, always as a list.
pub struct RandomBgHelper(Arc<SiteConfig>);

impl HelperDef for RandomBgHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		let count = count_param(h, 0);
		let list: Vec<String> = match param(h, 1) {
			Some(JsonValue::Array(items)) => items
				.iter()
				.filter_map(JsonValue::as_str)
				.map(str::to_owned)
				.collect(),
			_ => Vec::new(),
		};

		let images =
			ImageSampler::new(&self.0).random_bg(count, &list, &mut ThreadRandom::default());
		derived(images)
	}
}

/// `{{_md5 path}}`: hash of the path's resolved URL.
pub struct Md5Helper(Arc<SiteConfig>);

impl HelperDef for Md5Helper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		derived(paths::content_hash(&self.0, str_param(h, 0)?))
	}
}

/// `{{_permapath url}}`
pub struct PermapathHelper(Arc<SiteConfig>);

impl HelperDef for PermapathHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		derived(paths::permapath(&self.0, str_param(h, 0)?))
	}
}

/// `{{canonical}}`: the canonical link tag for the page's `url`, or for the given URL.
pub struct CanonicalHelper(Arc<SiteConfig>);

impl HelperDef for CanonicalHelper {
	fn call<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		ctx: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
		out: &mut dyn Output,
	) -> HelperResult {
		let url = param(h, 0)
			.or_else(|| ctx.data().get("url"))
			.and_then(JsonValue::as_str)
			.ok_or_else(|| RenderErrorReason::Other("canonical: no page url".to_string()))?;

		out.write(&paths::canonical_tag(&self.0, url))?;
		Ok(())
	}
}

/// `{{i18n_path language}}`: the current page in another language.
pub struct I18nPathHelper(Arc<SiteConfig>);

impl HelperDef for I18nPathHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		ctx: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		let language = str_param(h, 0)?;
		let page = ctx.data().get("page");
		let field = |name: &str| {
			page.and_then(|page| page.get(name))
				.and_then(JsonValue::as_str)
				.unwrap_or_default()
		};

		derived(paths::i18n_path(
			&self.0,
			field("path"),
			field("lang"),
			language,
		))
	}
}

/// `{{language_name language}}`
pub struct LanguageNameHelper(Arc<I18n>);

impl HelperDef for LanguageNameHelper {
	fn call_inner<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
	) -> Result<ScopedJson<'rc>, RenderError> {
		let language = str_param(h, 0)?;
		derived(self.0.language_name(language))
	}
}
