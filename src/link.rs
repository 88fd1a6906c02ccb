//! Module containing the link resolver behind the `_url` helper.
//!
//! A link is external when its target has a scheme and points at a host other than the site's.
//! External links either become `<span class="exturl" data-url="...">` (when the theme's `exturl`
//! option is on) with the target base64-encoded, or plain anchors opening in a new tab.

use std::{borrow::Cow, fmt};

use base64::{engine::general_purpose::STANDARD, Engine};
use handlebars::html_escape;
use itertools::Itertools;
use url::Url;

use crate::{paths, SiteConfig};

/// Class given to spanned external links.
pub const EXTURL_CLASS: &str = "exturl";

/// Value of a single HTML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
	/// Left out of the output entirely.
	Absent,
	/// Present without a value, like `<a external>`.
	Flag,
	Text(String),
	/// Joined with spaces on output.
	List(Vec<String>),
}

impl AttrValue {
	/// Creates a text value.
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text(value.into())
	}

	/// Turns a list into a space separated text value.
	pub fn flatten(self) -> Self {
		match self {
			Self::List(items) => Self::Text(items.iter().join(" ")),
			other => other,
		}
	}

	/// Gets the value as it would be written to the output, if it has one.
	pub fn as_text(&self) -> Option<Cow<'_, str>> {
		match self {
			Self::Text(text) => Some(Cow::Borrowed(text)),
			Self::List(items) => Some(Cow::Owned(items.iter().join(" "))),
			Self::Absent | Self::Flag => None,
		}
	}
}

/// An ordered set of HTML attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
	/// Creates an empty set of attributes.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style [`Attributes::set`].
	pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
		self.set(name, value);
		self
	}

	/// Sets an attribute, keeping its position if it was already set.
	pub fn set(&mut self, name: impl Into<String>, value: AttrValue) {
		let name = name.into();
		match self.0.iter_mut().find(|(existing, _)| *existing == name) {
			Some((_, existing)) => *existing = value,
			None => self.0.push((name, value)),
		}
	}

	/// Gets an attribute's value.
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0
			.iter()
			.find(|(existing, _)| existing == name)
			.map(|(_, value)| value)
	}

	/// Gets an attribute's output text, if it has one.
	pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
		self.get(name).and_then(AttrValue::as_text)
	}

	/// Whether the attribute will be written to the output.
	pub fn is_present(&self, name: &str) -> bool {
		!matches!(self.get(name), None | Some(AttrValue::Absent))
	}

	/// Iterates over the attributes in insertion order, absent ones included.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Renders the attributes with a leading space before each one.
	fn to_html(&self) -> String {
		let mut out = String::new();
		for (name, value) in self.iter() {
			match value {
				AttrValue::Absent => {}
				AttrValue::Flag => {
					out.push(' ');
					out.push_str(&html_escape(name));
				}
				AttrValue::Text(_) | AttrValue::List(_) => {
					let text = value.as_text().unwrap_or_default();
					out.push_str(&format!(
						r#" {}="{}""#,
						html_escape(name),
						html_escape(&text)
					));
				}
			}
		}
		out
	}
}

impl<N: Into<String>> FromIterator<(N, AttrValue)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (N, AttrValue)>>(iter: I) -> Self {
		let mut attributes = Self::new();
		for (name, value) in iter {
			attributes.set(name, value);
		}
		attributes
	}
}

/// A fully resolved tag, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
	pub tag_name: String,
	pub attributes: Attributes,
	/// Written as-is.
	pub inner_text: String,
	pub self_closing: bool,
}

impl TagDescriptor {
	/// Renders the tag as HTML.
	pub fn to_html(&self) -> String {
		let attributes = self.attributes.to_html();
		if self.self_closing {
			format!("<{}{}>", self.tag_name, attributes)
		} else {
			format!(
				"<{tag}{}>{}</{tag}>",
				attributes,
				self.inner_text,
				tag = self.tag_name
			)
		}
	}
}

impl fmt::Display for TagDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_html())
	}
}

/// Resolves link targets into tags.
#[derive(Debug, Clone)]
pub struct LinkResolver<'a> {
	config: &'a SiteConfig,
	site_host: String,
}

impl<'a> LinkResolver<'a> {
	/// Creates a new link resolver for the given site.
	pub fn new(config: &'a SiteConfig) -> Self {
		let site_host = Url::parse(&config.url)
			.ok()
			.and_then(|url| url.host_str().map(str::to_owned))
			.unwrap_or_else(|| config.url.clone());

		Self { config, site_host }
	}

	/// Whether the target points away from the site. Targets that fail to parse never do.
	pub fn is_external(&self, target: &str) -> bool {
		match Url::parse(target) {
			Ok(url) => url.host_str() != Some(self.site_host.as_str()),
			Err(_) => false,
		}
	}

	/// Resolves a link. Returns `None` when there is nothing to link to.
	pub fn resolve(&self, target: &str, text: &str, options: &Attributes) -> Option<TagDescriptor> {
		if target.is_empty() {
			tracing::debug!("empty link target, rendering nothing");
			return None;
		}

		let external = self.is_external(target);
		let spanned = external && self.config.theme.exturl;

		let (tag_name, mut attributes) = if spanned {
			(
				"span",
				Attributes::new()
					.with("class", AttrValue::text(EXTURL_CLASS))
					.with("data-url", AttrValue::Text(STANDARD.encode(target))),
			)
		} else {
			(
				"a",
				Attributes::new().with("href", AttrValue::Text(self.config.url_for(target))),
			)
		};

		for (name, value) in options.iter() {
			if spanned && name == "class" {
				append_class(&mut attributes, value);
			} else {
				attributes.set(name, value.clone());
			}
		}

		if let Some(class) = attributes.get("class").cloned() {
			attributes.set("class", class.flatten());
		}

		if spanned {
			attributes.set("rel", AttrValue::Absent);
			attributes.set("target", AttrValue::Absent);
		} else if external {
			attributes.set("rel", AttrValue::text("noopener"));
			attributes.set("target", AttrValue::text("_blank"));
			attributes.set("external", AttrValue::Flag);
		}

		Some(TagDescriptor {
			tag_name: tag_name.to_string(),
			attributes,
			inner_text: decode_text(text),
			self_closing: false,
		})
	}
}

/// Adds caller classes after the `exturl` class.
fn append_class(attributes: &mut Attributes, value: &AttrValue) {
	let Some(extra) = value.as_text().filter(|extra| !extra.is_empty()) else {
		return;
	};
	let class = match attributes.text("class") {
		Some(existing) => format!("{existing} {extra}"),
		None => extra.into_owned(),
	};
	attributes.set("class", AttrValue::Text(class));
}

/// Percent-decodes link text like `decodeURI`, leaving it alone if it doesn't decode to UTF-8.
fn decode_text(text: &str) -> String {
	paths::decode_uri(text).unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn config(exturl: bool) -> SiteConfig {
		SiteConfig::from_yaml(&format!(
			"url: https://example.com\ntheme:\n  exturl: {exturl}\n"
		))
		.unwrap()
	}

	fn text(value: &str) -> AttrValue {
		AttrValue::text(value)
	}

	#[test]
	fn empty_target_renders_nothing() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		assert_eq!(resolver.resolve("", "text", &Attributes::new()), None);
	}

	#[test]
	fn classifies_targets() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		assert!(resolver.is_external("https://github.com/shoka"));
		assert!(resolver.is_external("mailto:someone@example.org"));
		assert!(!resolver.is_external("https://example.com/about/"));
		assert!(!resolver.is_external("/about/"));
		assert!(!resolver.is_external("about/"));
		assert!(!resolver.is_external("//cdn.example.org/x.js"));
		assert!(!resolver.is_external("http://[not a host/"));
	}

	#[test]
	fn internal_links_are_plain_anchors() {
		for exturl in [false, true] {
			let site = config(exturl);
			let resolver = LinkResolver::new(&site);
			for target in ["/about/", "https://example.com/about/", "posts/a b/"] {
				let tag = resolver.resolve(target, "About", &Attributes::new()).unwrap();
				assert_eq!(tag.tag_name, "a");
				assert!(tag.attributes.is_present("href"));
				assert!(!tag.attributes.is_present("rel"));
				assert!(!tag.attributes.is_present("target"));
				assert!(!tag.attributes.is_present("external"));
				assert!(!tag.attributes.is_present("class"));
				assert!(!tag.attributes.is_present("data-url"));
			}
		}
	}

	#[test]
	fn external_links_open_in_new_tab() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		let tag = resolver
			.resolve("https://github.com/", "GitHub", &Attributes::new())
			.unwrap();
		assert_eq!(tag.tag_name, "a");
		assert_eq!(tag.attributes.get("href"), Some(&text("https://github.com/")));
		assert_eq!(tag.attributes.get("rel"), Some(&text("noopener")));
		assert_eq!(tag.attributes.get("target"), Some(&text("_blank")));
		assert_eq!(tag.attributes.get("external"), Some(&AttrValue::Flag));
		assert_eq!(
			tag.to_html(),
			r#"<a href="https://github.com/" rel="noopener" target="_blank" external>GitHub</a>"#
		);
	}

	#[test]
	fn external_link_markers_win_over_options() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		let options: Attributes = vec![
			("rel", text("nofollow")),
			("target", AttrValue::Absent),
			("title", text("Go")),
		]
		.into_iter()
		.collect();
		let tag = resolver.resolve("https://github.com/", "GitHub", &options).unwrap();
		assert_eq!(tag.attributes.get("rel"), Some(&text("noopener")));
		assert_eq!(tag.attributes.get("target"), Some(&text("_blank")));
		assert_eq!(tag.attributes.get("title"), Some(&text("Go")));
	}

	#[test]
	fn spanned_links_encode_the_target() {
		let site = config(true);
		let resolver = LinkResolver::new(&site);
		let target = "https://github.com/amehime/hexo-theme-shoka?tab=readme";
		let tag = resolver.resolve(target, "Shoka", &Attributes::new()).unwrap();
		assert_eq!(tag.tag_name, "span");
		assert!(!tag.attributes.is_present("href"));
		assert!(!tag.attributes.is_present("rel"));
		assert!(!tag.attributes.is_present("target"));
		assert_eq!(tag.attributes.get("class"), Some(&text(EXTURL_CLASS)));

		let encoded = tag.attributes.text("data-url").unwrap();
		let decoded = STANDARD.decode(encoded.as_bytes()).unwrap();
		assert_eq!(String::from_utf8(decoded).unwrap(), target);
	}

	#[test]
	fn spanned_links_append_classes() {
		let site = config(true);
		let resolver = LinkResolver::new(&site);

		let options = Attributes::new().with("class", text("foo"));
		let tag = resolver.resolve("https://github.com/", "x", &options).unwrap();
		assert_eq!(tag.attributes.get("class"), Some(&text("exturl foo")));

		let options = Attributes::new().with(
			"class",
			AttrValue::List(vec!["menu-item".to_string(), "active".to_string()]),
		);
		let tag = resolver.resolve("https://github.com/", "x", &options).unwrap();
		assert_eq!(tag.attributes.get("class"), Some(&text("exturl menu-item active")));

		let options = Attributes::new().with("class", AttrValue::Absent);
		let tag = resolver.resolve("https://github.com/", "x", &options).unwrap();
		assert_eq!(tag.attributes.get("class"), Some(&text(EXTURL_CLASS)));
	}

	#[test]
	fn spanned_links_never_carry_rel_or_target() {
		let site = config(true);
		let resolver = LinkResolver::new(&site);
		let options = Attributes::new()
			.with("rel", text("me"))
			.with("target", text("_self"));
		let tag = resolver.resolve("https://github.com/", "x", &options).unwrap();
		assert!(!tag.attributes.is_present("rel"));
		assert!(!tag.attributes.is_present("target"));
		assert_eq!(
			tag.to_html(),
			r#"<span class="exturl" data-url="aHR0cHM6Ly9naXRodWIuY29tLw&#x3D;&#x3D;">x</span>"#
		);
	}

	#[test]
	fn options_override_defaults_on_internal_links() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		let options = Attributes::new()
			.with("href", text("/elsewhere/"))
			.with("class", AttrValue::List(vec!["a".to_string(), "b".to_string()]));
		let tag = resolver.resolve("/about/", "About", &options).unwrap();
		assert_eq!(tag.attributes.get("href"), Some(&text("/elsewhere/")));
		assert_eq!(tag.attributes.get("class"), Some(&text("a b")));

		let options = Attributes::new().with("href", AttrValue::Absent);
		let tag = resolver.resolve("/about/", "About", &options).unwrap();
		assert_eq!(tag.to_html(), "<a>About</a>");
	}

	#[test]
	fn text_is_percent_decoded() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		let tag = resolver
			.resolve("/tags/rust/", "%E6%A0%87%E7%AD%BE%20rust", &Attributes::new())
			.unwrap();
		assert_eq!(tag.inner_text, "标签 rust");

		let tag = resolver.resolve("/", "100%", &Attributes::new()).unwrap();
		assert_eq!(tag.inner_text, "100%");
	}

	#[test]
	fn text_keeps_escaped_delimiters() {
		let site = config(false);
		let resolver = LinkResolver::new(&site);
		let tag = resolver
			.resolve("/a/", "a%2Fb%23c%3F", &Attributes::new())
			.unwrap();
		assert_eq!(tag.inner_text, "a%2Fb%23c%3F");

		let tag = resolver.resolve("/a/", "%FF%20", &Attributes::new()).unwrap();
		assert_eq!(tag.inner_text, "%FF%20");
	}

	#[test]
	fn site_host_falls_back_to_raw_url() {
		let site = SiteConfig::from_yaml("url: localhost\n").unwrap();
		let resolver = LinkResolver::new(&site);
		assert!(!resolver.is_external("/about/"));
		assert!(resolver.is_external("https://localhost.example/"));
	}
}
