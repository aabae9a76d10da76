use serde::Deserialize;

/// The fields of a GitHub release this tool reads.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}
