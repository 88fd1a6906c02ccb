use serde::de::DeserializeOwned;

/// Very basic YAML front matter parser.
#[derive(Debug)]
pub struct FrontMatter<T> {
	/// The content past the front matter.
	pub content: String,
	/// The front matter found, if any.
	pub data: Option<T>,
}

impl<T> FrontMatter<T>
where
	T: DeserializeOwned,
{
	/// Parses the given input for front matter.
	pub fn parse(input: String) -> eyre::Result<Self> {
		let normalized = input.replace("\r\n", "\n");
		if let Some(rest) = normalized.strip_prefix("---\n") {
			let split = if let Some(content) = rest.strip_prefix("---\n") {
				Some(("", content))
			} else {
				rest.split_once("\n---\n")
			};
			if let Some((frontmatter, content)) = split {
				let data = if frontmatter.trim().is_empty() {
					None
				} else {
					Some(serde_yml::from_str(frontmatter)?)
				};
				return Ok(Self {
					content: content.to_string(),
					data,
				});
			}
		}
		Ok(Self {
			content: input,
			data: None,
		})
	}
}
