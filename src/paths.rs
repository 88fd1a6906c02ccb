//! Module containing URL and path helpers: `url_for`, permalinks, content hashes and localized paths.

use std::{borrow::Cow, str::Utf8Error};

use itertools::Itertools;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::SiteConfig;

/// Characters `encodeURI` leaves alone.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b';')
	.remove(b',')
	.remove(b'/')
	.remove(b'?')
	.remove(b':')
	.remove(b'@')
	.remove(b'&')
	.remove(b'=')
	.remove(b'+')
	.remove(b'$')
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')')
	.remove(b'#');

/// Whether the path is left untouched by URL resolution.
fn is_passthrough(path: &str) -> bool {
	path.starts_with('#') || path.starts_with("//") || Url::parse(path).is_ok()
}

/// Collapses runs of slashes into a single one.
fn collapse_slashes(path: &str) -> String {
	path.chars()
		.coalesce(|a, b| {
			if a == '/' && b == '/' {
				Ok('/')
			} else {
				Err((a, b))
			}
		})
		.collect()
}

/// Bytes whose escapes `decodeURI` leaves encoded.
const RESERVED: &[u8] = b"#$&+,/:;=?@";

/// Whether `bytes` starts with an escape of a reserved byte, like `%2F`.
fn is_reserved_escape(bytes: &[u8]) -> bool {
	match bytes {
		[b'%', hi, lo, ..] => match ((*hi as char).to_digit(16), (*lo as char).to_digit(16)) {
			(Some(hi), Some(lo)) => RESERVED.contains(&((hi * 16 + lo) as u8)),
			_ => false,
		},
		_ => false,
	}
}

/// Splits text into runs, with each reserved escape as its own run flagged `true`.
fn split_reserved(text: &str) -> Vec<(&str, bool)> {
	let bytes = text.as_bytes();
	let mut runs = Vec::new();
	let (mut start, mut i) = (0, 0);
	while i < bytes.len() {
		if is_reserved_escape(&bytes[i..]) {
			if start < i {
				runs.push((&text[start..i], false));
			}
			runs.push((&text[i..i + 3], true));
			i += 3;
			start = i;
		} else {
			i += 1;
		}
	}
	if start < bytes.len() {
		runs.push((&text[start..], false));
	}
	runs
}

/// Percent-decodes text like `decodeURI`: escapes of reserved characters stay encoded.
pub(crate) fn decode_uri(text: &str) -> Result<String, Utf8Error> {
	split_reserved(text)
		.into_iter()
		.map(|(run, reserved)| {
			if reserved {
				Ok(Cow::Borrowed(run))
			} else {
				percent_decode_str(run).decode_utf8()
			}
		})
		.collect()
}

/// Percent-encodes a path like `encodeURI`, without encoding it twice.
///
/// Escaped reserved characters such as `%2F` or `%23` are kept as they are.
fn encode_uri(path: &str) -> String {
	split_reserved(path)
		.into_iter()
		.map(|(run, reserved)| {
			if reserved {
				Cow::Borrowed(run)
			} else {
				let decoded = percent_decode_str(run).decode_utf8_lossy();
				Cow::Owned(utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string())
			}
		})
		.collect()
}

/// Applies the site's pretty URL options.
fn prettify(config: &SiteConfig, mut path: String) -> String {
	if !config.pretty_urls.trailing_index {
		if let Some(stripped) = path.strip_suffix("index.html") {
			path.truncate(stripped.len());
		}
	}
	if !config.pretty_urls.trailing_html && !path.ends_with("index.html") {
		if let Some(stripped) = path.strip_suffix(".html") {
			path.truncate(stripped.len());
		}
	}
	path
}

/// Resolves a site-relative path to a URL under the site's root.
///
/// Fragments, protocol-relative URLs and anything with a scheme are returned as-is.
pub fn url_for(config: &SiteConfig, path: &str) -> String {
	if is_passthrough(path) {
		return path.to_string();
	}

	let joined = collapse_slashes(&format!("{}/{}", config.root, path));
	prettify(config, encode_uri(&joined))
}

/// Resolves a site-relative path to an absolute URL on the site.
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
	if is_passthrough(path) {
		return path.to_string();
	}

	let path = collapse_slashes(&format!("/{path}"));
	format!(
		"{}{}",
		config.url.trim_end_matches('/'),
		prettify(config, encode_uri(&path))
	)
}

/// Strips `index.html` from a path, and `.html` too unless permalinks end in `.html`.
pub fn canonical_path(raw: &str, permalink_ends_with_html: bool) -> String {
	let path = raw.strip_suffix("index.html").unwrap_or(raw);
	let path = if permalink_ends_with_html {
		path
	} else {
		path.strip_suffix(".html").unwrap_or(path)
	};
	path.to_string()
}

/// [`canonical_path`] using the site's permalink pattern.
pub fn permapath(config: &SiteConfig, raw: &str) -> String {
	canonical_path(raw, config.permalink.ends_with(".html"))
}

/// Renders the `<link rel="canonical">` tag for a page URL.
pub fn canonical_tag(config: &SiteConfig, page_url: &str) -> String {
	format!(
		r#"<link rel="canonical" href="{}">"#,
		permapath(config, page_url)
	)
}

/// MD5 of the resolved URL for `path`, as lowercase hex.
pub fn content_hash(config: &SiteConfig, path: &str) -> String {
	format!("{:x}", md5::compute(url_for(config, path).as_bytes()))
}

/// Strips the language segment from the front of a page path.
fn strip_language<'p>(path: &'p str, lang: &str) -> &'p str {
	if lang.is_empty() {
		return path;
	}
	match path.strip_prefix(lang) {
		Some(rest) if rest.is_empty() => rest,
		Some(rest) => rest.strip_prefix('/').unwrap_or(path),
		None => path,
	}
}

/// Gets the path of the current page in another language, before URL resolution.
///
/// The default language has no prefix, every other language gets `/<language>`.
pub fn localized_path(
	current_path: &str,
	current_lang: &str,
	language: &str,
	is_default_language: bool,
) -> String {
	let base = strip_language(current_path.trim_start_matches('/'), current_lang);
	if is_default_language {
		format!("/{base}")
	} else {
		format!("/{language}/{base}")
	}
}

/// Resolves the URL of the current page in another language.
pub fn i18n_path(
	config: &SiteConfig,
	current_path: &str,
	current_lang: &str,
	language: &str,
) -> String {
	url_for(
		config,
		&localized_path(
			current_path,
			current_lang,
			language,
			config.is_default_language(language),
		),
	)
}
