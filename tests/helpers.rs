use std::{collections::HashSet, sync::Arc};

use handlebars::Handlebars;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shoka::{helpers::register_helpers, i18n::I18n, SiteConfig};

const SITE: &str = "url: https://example.com\nlanguage:\n  - en\n  - ja\n";

fn registry(yaml: &str) -> Handlebars<'static> {
	let config = SiteConfig::from_yaml(yaml).unwrap();
	let mut i18n = I18n::default();
	i18n.insert_yaml("ja", "name: 日本語\n").unwrap();

	let mut reg = Handlebars::new();
	register_helpers(&mut reg, Arc::new(config), Arc::new(i18n));
	reg
}

fn render(reg: &Handlebars, template: &str, data: &Value) -> String {
	reg.render_template(template, data).unwrap()
}

fn with_pool(len: usize) -> String {
	let mut yaml = format!("{SITE}theme:\n  image_list:\n");
	for i in 0..len {
		yaml.push_str(&format!("    - {i}.jpg\n"));
	}
	yaml
}

fn items(output: &str) -> Vec<String> {
	output
		.split(';')
		.filter(|item| !item.is_empty())
		.map(str::to_owned)
		.collect()
}

#[test]
fn url_renders_internal_links() {
	let reg = registry(SITE);
	assert_eq!(
		render(&reg, r#"{{_url "/about/" "About"}}"#, &json!({})),
		r#"<a href="/about/">About</a>"#
	);
}

#[test]
fn url_renders_external_links() {
	let reg = registry(SITE);
	assert_eq!(
		render(&reg, r#"{{_url "https://github.com/" "GitHub"}}"#, &json!({})),
		r#"<a href="https://github.com/" rel="noopener" target="_blank" external>GitHub</a>"#
	);
}

#[test]
fn url_renders_spanned_external_links() {
	let reg = registry(&format!("{SITE}theme:\n  exturl: true\n"));
	let out = render(
		&reg,
		r#"{{_url "https://github.com/" "GitHub" class="menu-item"}}"#,
		&json!({}),
	);
	assert_eq!(
		out,
		r#"<span class="exturl menu-item" data-url="aHR0cHM6Ly9naXRodWIuY29tLw&#x3D;&#x3D;">GitHub</span>"#
	);
}

#[test]
fn url_renders_nothing_without_target() {
	let reg = registry(SITE);
	assert_eq!(render(&reg, r#"[{{_url page.link "x"}}]"#, &json!({"page": {}})), "[]");
	assert_eq!(render(&reg, r#"[{{_url "" "x"}}]"#, &json!({})), "[]");
}

#[test]
fn url_merges_option_objects() {
	let reg = registry(SITE);
	let data = json!({"options": {"class": ["a", "b"], "title": "T"}});
	assert_eq!(
		render(&reg, r#"{{_url "/a/" "A" options}}"#, &data),
		r#"<a href="/a/" class="a b" title="T">A</a>"#
	);
}

#[test]
fn url_rejects_non_string_targets() {
	let reg = registry(SITE);
	assert!(reg.render_template("{{_url 3 \"x\"}}", &json!({})).is_err());
}

#[test]
fn random_bg_draws_distinct_images() {
	let reg = registry(&with_pool(10));
	for _ in 0..50 {
		let picked = items(&render(
			&reg,
			"{{#each (random_bg 3)}}{{this}};{{/each}}",
			&json!({}),
		));
		assert_eq!(picked.len(), 3);
		assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
		assert!(picked.iter().all(|url| url.starts_with("/assets/covers/")));
	}
}

#[test]
fn random_bg_single_is_still_a_list() {
	let reg = registry(&with_pool(10));
	let picked = items(&render(
		&reg,
		"{{#each (random_bg 1)}}{{this}};{{/each}}",
		&json!({}),
	));
	assert_eq!(picked.len(), 1);
}

#[test]
fn random_bg_without_images_is_empty() {
	let reg = registry(SITE);
	assert_eq!(
		render(&reg, "[{{#each (random_bg 3)}}{{this}}{{/each}}]", &json!({})),
		"[]"
	);
}

#[test]
fn cover_uses_item_images() {
	let reg = registry(&with_pool(3));
	let data = json!({"page": {"cover": "a.png", "path": "posts/a/"}});
	assert_eq!(render(&reg, "{{_cover page}}", &data), "/a.png");

	let data = json!({"page": {"photos": ["p.png"], "path": "posts/a/"}});
	assert_eq!(render(&reg, "{{_cover page}}", &data), "/p.png");
}

#[test]
fn cover_draws_from_the_pool_without_repeats() {
	let reg = registry(&with_pool(3));
	let data = json!({"page": {"path": "posts/a/"}});
	let picked = items(&render(
		&reg,
		"{{#each (_cover page 5)}}{{this}};{{/each}}",
		&data,
	));
	assert_eq!(picked.len(), 3);
	assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);

	let single = render(&reg, "{{_cover page}}", &data);
	assert!(single.starts_with("/assets/covers/"));
}

#[test]
fn cover_skips_malformed_items() {
	let reg = registry(&with_pool(3));
	let items = [
		json!({"path": null}),
		json!({"photos": [1]}),
		json!("x"),
		json!({"cover": 5}),
		json!({"photos": "p.png", "path": 3}),
	];
	for item in items {
		let out = reg
			.render_template("{{_cover page}}", &json!({ "page": item.clone() }))
			.unwrap();
		assert!(out.starts_with("/assets/covers/"), "{item} rendered {out:?}");
	}

	let data = json!({"page": {"cover": 5, "photos": ["p.png"], "path": null}});
	assert_eq!(render(&reg, "{{_cover page}}", &data), "/p.png");
}

#[test]
fn cover_without_images_is_empty() {
	let reg = registry(SITE);
	let data = json!({"page": {"path": "posts/a/"}});
	assert_eq!(render(&reg, "[{{_cover page}}]", &data), "[]");
	assert_eq!(
		render(&reg, "[{{#each (_cover page 2)}}{{this}}{{/each}}]", &data),
		"[]"
	);
}

#[test]
fn image_url_resolves_statics() {
	let reg = registry(SITE);
	assert_eq!(
		render(&reg, r#"{{_image_url "a.png" "posts/x/"}}"#, &json!({})),
		"/a.png"
	);
}

#[test]
fn md5_hashes_resolved_url() {
	let reg = registry(&format!("{SITE}root: /blog/\n"));
	assert_eq!(
		render(&reg, r#"{{_md5 "about/"}}"#, &json!({})),
		format!("{:x}", md5::compute("/blog/about/"))
	);
	assert!(reg.render_template("{{_md5}}", &json!({})).is_err());
}

#[test]
fn permapath_and_canonical() {
	let reg = registry(SITE);
	assert_eq!(render(&reg, r#"{{_permapath "/a/b.html"}}"#, &json!({})), "/a/b");
	assert_eq!(
		render(
			&reg,
			"{{canonical}}",
			&json!({"url": "https://example.com/a/index.html"})
		),
		r#"<link rel="canonical" href="https://example.com/a/">"#
	);
	assert!(reg.render_template("{{canonical}}", &json!({})).is_err());
}

#[test]
fn i18n_path_switches_language() {
	let reg = registry(SITE);
	let data = json!({"page": {"path": "ja/about/index.html", "lang": "ja"}});
	assert_eq!(render(&reg, r#"{{i18n_path "en"}}"#, &data), "/about/index.html");
	assert_eq!(render(&reg, r#"{{i18n_path "ja"}}"#, &data), "/ja/about/index.html");
}

#[test]
fn language_name_falls_back_to_tag() {
	let reg = registry(SITE);
	assert_eq!(render(&reg, r#"{{language_name "ja"}}"#, &json!({})), "日本語");
	assert_eq!(render(&reg, r#"{{language_name "fr"}}"#, &json!({})), "fr");
}
