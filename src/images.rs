//! Module containing cover and background image selection.

use rand::{rngs::ThreadRng, Rng};
use serde::Serialize;

use crate::SiteConfig;

/// Directory the theme's image pool is served from.
pub(crate) const COVERS_PATH: &str = "/assets/covers/";

/// Source of uniform random indices.
pub trait RandomSource {
	/// Returns an index in `0..upper`. `upper` is never zero.
	fn below(&mut self, upper: usize) -> usize;
}

/// Random source backed by the thread-local generator.
#[derive(Debug, Default)]
pub struct ThreadRandom(ThreadRng);

impl RandomSource for ThreadRandom {
	fn below(&mut self, upper: usize) -> usize {
		self.0.gen_range(0..upper)
	}
}

/// Shuffles the last `count` positions of a copy of `pool` and returns them.
///
/// `count` is clamped to the pool's size.
pub fn shuffle_tail<T: Clone>(pool: &[T], count: usize, rng: &mut impl RandomSource) -> Vec<T> {
	let mut shuffled = pool.to_vec();
	let len = shuffled.len();
	let min = len - count.min(len);

	for i in (min..len).rev() {
		let index = rng.below(i + 1);
		shuffled.swap(index, i);
	}

	shuffled.split_off(min)
}

/// Picks a single element of `pool`.
pub fn pick_one<'p, T>(pool: &'p [T], rng: &mut impl RandomSource) -> Option<&'p T> {
	if pool.is_empty() {
		return None;
	}
	pool.get(rng.below(pool.len()))
}

/// Draws up to `count` elements, removing each from a copy of `pool` as it's drawn.
pub fn draw_distinct<T: Clone>(pool: &[T], count: usize, rng: &mut impl RandomSource) -> Vec<T> {
	let mut remaining = pool.to_vec();
	let mut drawn = Vec::with_capacity(count.min(remaining.len()));

	while drawn.len() < count && !remaining.is_empty() {
		let index = rng.below(remaining.len());
		drawn.push(remaining.remove(index));
	}

	drawn
}

/// One or more image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Sample {
	One(String),
	Many(Vec<String>),
}

/// The parts of a post or page used to pick its cover.
#[derive(Debug, Clone, Default)]
pub struct CoverItem {
	/// Explicit cover image.
	pub cover: Option<String>,
	pub photos: Option<Vec<String>>,
	/// The item's path, used for post asset folders.
	pub path: String,
}

/// Whether an image name is already a URL.
fn is_absolute(name: &str) -> bool {
	name.starts_with("//") || name.starts_with("http")
}

/// Picks cover and background images for the site's theme.
#[derive(Debug, Clone, Copy)]
pub struct ImageSampler<'a> {
	config: &'a SiteConfig,
}

impl<'a> ImageSampler<'a> {
	/// Creates a new image sampler for the given site.
	pub fn new(config: &'a SiteConfig) -> Self {
		Self { config }
	}

	/// Resolves the URL of an image from the theme's pool.
	pub fn cover_url(&self, name: &str) -> String {
		if name.is_empty() {
			String::new()
		} else if is_absolute(name) {
			name.to_string()
		} else {
			self.config.url_for(&format!("{COVERS_PATH}{name}"))
		}
	}

	/// Resolves the URL of an image belonging to an item.
	pub fn image_url(&self, img: &str, item_path: &str) -> String {
		if is_absolute(img) {
			return img.to_string();
		}
		let folder = if self.config.post_asset_folder {
			item_path
		} else {
			""
		};
		self.config
			.url_for(&format!("{}{folder}{img}", self.config.theme.statics))
	}

	/// Picks background images. Always returns a list, with a single image unless `count > 1`.
	///
	/// An empty `image_list` falls back to the theme's pool.
	pub fn random_bg(
		&self,
		count: usize,
		image_list: &[String],
		rng: &mut impl RandomSource,
	) -> Vec<String> {
		let pool = if image_list.is_empty() {
			self.config.theme.image_list.as_slice()
		} else {
			image_list
		};
		if pool.is_empty() {
			tracing::debug!("no images to pick a background from");
			return Vec::new();
		}

		if count > 1 {
			shuffle_tail(pool, count, rng)
				.iter()
				.map(|name| self.cover_url(name))
				.collect()
		} else {
			pick_one(pool, rng)
				.map(|name| self.cover_url(name))
				.into_iter()
				.collect()
		}
	}

	/// Picks the cover for an item: its own cover, then its first photo, then the theme's pool.
	///
	/// Multiple images are only drawn from the pool, and never repeat.
	pub fn cover(&self, item: &CoverItem, count: usize, rng: &mut impl RandomSource) -> Sample {
		if let Some(cover) = item.cover.as_deref().filter(|cover| !cover.is_empty()) {
			return Sample::One(self.image_url(cover, &item.path));
		}
		if let Some(photo) = item.photos.as_deref().and_then(<[String]>::first) {
			return Sample::One(self.image_url(photo, &item.path));
		}

		let pool = &self.config.theme.image_list;
		if pool.is_empty() {
			tracing::debug!(path = %item.path, "no cover images configured");
		}

		if count > 1 {
			Sample::Many(
				draw_distinct(pool, count, rng)
					.iter()
					.map(|name| self.cover_url(name))
					.collect(),
			)
		} else {
			Sample::One(
				pick_one(pool, rng)
					.map(|name| self.cover_url(name))
					.unwrap_or_default(),
			)
		}
	}
}
