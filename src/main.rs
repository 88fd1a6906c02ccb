use std::path::Path;

use shoka::Site;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> eyre::Result<()> {
	#[cfg(feature = "color-eyre")]
	color_eyre::install()?;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer())
		.init();

	let site = Site::new(Path::new("site"))?;
	site.build_once()?;

	tracing::info!("Build complete!");

	Ok(())
}
