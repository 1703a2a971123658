//! Release catalog built from the root repository's tags

use super::handle::RepoHandle;
use crate::error::{RepoError, RepoResult};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use xref_lexer::config::compile_time::repository::RELEASE_COMPONENTS;
use xref_lexer::log_success;
use xref_lexer::logging::codes;

const COMPONENT_PATTERN: &str = r"\d+|[a-z]+|\.";

fn component_pattern() -> RepoResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(COMPONENT_PATTERN))
        .as_ref()
        .map_err(|e| RepoError::Pattern {
            pattern: COMPONENT_PATTERN,
            reason: e.to_string(),
        })
}

/// One piece of a version string
///
/// Text sorts below any number, so `1.0.0.rc1` stays below `1.0.0.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Component {
    Text(String),
    Num(Number),
}

/// Decimal digit run of any length, compared by value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number(String);

impl Number {
    fn from_digits(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number(n.to_string())
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Text(text) => f.write_str(text),
            Component::Num(n) => write!(f, "{}", n),
        }
    }
}

/// A tag that starts with a digit, split into comparable components
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<Component>,
}

impl Version {
    /// `None` for tags that do not start with an ASCII digit
    pub fn parse(tag: &str) -> RepoResult<Option<Self>> {
        if !tag.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(None);
        }
        let pattern = component_pattern()?;

        let mut components = Vec::new();
        let mut last = 0;
        for found in pattern.find_iter(tag) {
            if found.start() > last {
                components.push(Component::Text(tag[last..found.start()].to_string()));
            }
            last = found.end();

            let piece = found.as_str();
            if piece == "." {
                continue;
            }
            components.push(if piece.starts_with(|c: char| c.is_ascii_digit()) {
                Component::Num(Number::from_digits(piece))
            } else {
                Component::Text(piece.to_string())
            });
        }
        if last < tag.len() {
            components.push(Component::Text(tag[last..].to_string()));
        }

        Ok(Some(Self {
            raw: tag.to_string(),
            components,
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_release(&self) -> bool {
        self.components.len() == RELEASE_COMPONENTS
    }

    /// Whether this prerelease belongs to the given release line
    fn extends(&self, release: &Version) -> bool {
        self.components.len() > RELEASE_COMPONENTS
            && self.components[..RELEASE_COMPONENTS] == release.components[..]
    }

    /// `v<major> <major>.<minor> <version>`
    pub fn annotated(&self) -> String {
        let major = self.components.first().map(ToString::to_string).unwrap_or_default();
        let minor = self.components.get(1).map(ToString::to_string).unwrap_or_default();
        format!("v{} {}.{} {}", major, major, minor, self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Releases, newest first, plus prereleases of lines with no release yet
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    versions: Vec<Version>,
    source: PathBuf,
}

impl VersionCatalog {
    /// Read every tag of the root repository
    pub fn load(root: &RepoHandle) -> RepoResult<Self> {
        let output = root.git(&["tag"])?;
        let text = String::from_utf8_lossy(&output);
        let catalog = Self::from_tags(text.lines(), root.path())?;

        log_success!(codes::success::CATALOG_BUILT, "Version catalog built",
            "versions" => catalog.versions.len(),
            "repo" => root.path().display()
        );
        Ok(catalog)
    }

    pub fn from_tags<I, S>(tags: I, source: impl Into<PathBuf>) -> RepoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut releases = Vec::new();
        let mut others = Vec::new();

        for tag in tags {
            let Some(version) = Version::parse(tag.as_ref())? else {
                continue;
            };
            if version.is_release() {
                releases.push(version);
            } else {
                others.push(version);
            }
        }

        let mut versions = releases;
        for candidate in others {
            let shadowed = versions
                .iter()
                .any(|v| v.is_release() && candidate.extends(v));
            if candidate.components.len() > RELEASE_COMPONENTS && !shadowed {
                versions.push(candidate);
            }
        }

        // Stable, so equal versions keep tag order
        versions.sort_by(|a, b| b.cmp(a));

        Ok(Self {
            versions,
            source: source.into(),
        })
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn latest(&self) -> RepoResult<&Version> {
        self.versions.first().ok_or_else(|| RepoError::EmptyCatalog {
            path: self.source.clone(),
        })
    }

    pub fn render_plain(&self) -> Vec<u8> {
        self.versions
            .iter()
            .map(|v| format!("{}\n", v))
            .collect::<String>()
            .into_bytes()
    }

    pub fn render_annotated(&self) -> Vec<u8> {
        self.versions
            .iter()
            .map(|v| format!("{}\n", v.annotated()))
            .collect::<String>()
            .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scripted::ScriptedRunner;
    use assert_matches::assert_matches;
    use std::rc::Rc;

    fn catalog(tags: &[&str]) -> VersionCatalog {
        VersionCatalog::from_tags(tags.iter().copied(), "/srv/repo").unwrap()
    }

    fn listed(catalog: &VersionCatalog) -> Vec<&str> {
        catalog.versions().iter().map(Version::as_str).collect()
    }

    #[test]
    fn test_components() {
        let version = Version::parse("1.0.0-rc.1").unwrap().unwrap();
        assert_eq!(
            version.components(),
            &[
                Component::Num(1.into()),
                Component::Num(0.into()),
                Component::Num(0.into()),
                Component::Text("-".to_string()),
                Component::Text("rc".to_string()),
                Component::Num(1.into()),
            ]
        );

        let upper = Version::parse("2.0.0-RC1").unwrap().unwrap();
        assert_eq!(upper.components()[3], Component::Text("-RC".to_string()));
    }

    #[test]
    fn test_oversized_numbers_compare_by_value() {
        let catalog = catalog(&[
            "1.0.99999999999999999999",
            "1.0.100000000000000000000",
            "1.0.7",
            "1.0.007.1",
        ]);
        assert_eq!(
            listed(&catalog),
            vec!["1.0.100000000000000000000", "1.0.99999999999999999999", "1.0.7"]
        );

        let big = Version::parse("123456789012345678901234.0.0").unwrap().unwrap();
        assert!(big > Version::parse("9.0.0").unwrap().unwrap());
        assert_eq!(big.components()[0].to_string(), "123456789012345678901234");
    }

    #[test]
    fn test_non_digit_tags_excluded() {
        let catalog = catalog(&["v1.0.0", "latest", "", "1.0.0"]);
        assert_eq!(listed(&catalog), vec!["1.0.0"]);
    }

    #[test]
    fn test_numeric_ordering() {
        let catalog = catalog(&["1.2.2", "1.10.0", "1.2.10"]);
        assert_eq!(listed(&catalog), vec!["1.10.0", "1.2.10", "1.2.2"]);
    }

    #[test]
    fn test_release_shadows_prereleases() {
        let catalog = catalog(&["1.0.0-rc.1", "1.0.0", "1.0.0-beta.2"]);
        assert_eq!(listed(&catalog), vec!["1.0.0"]);
    }

    #[test]
    fn test_lone_prerelease_surfaces() {
        let catalog = catalog(&["1.0.0", "2.0.0-alpha.1", "2.0.0-alpha.2"]);
        assert_eq!(
            listed(&catalog),
            vec!["2.0.0-alpha.2", "2.0.0-alpha.1", "1.0.0"]
        );
    }

    #[test]
    fn test_short_versions_dropped() {
        let catalog = catalog(&["1.0", "3", "1.0.0"]);
        assert_eq!(listed(&catalog), vec!["1.0.0"]);
    }

    #[test]
    fn test_latest() {
        let catalog = catalog(&["4.0.0", "5.0.0-rc.0", "4.1.1"]);
        assert_eq!(catalog.latest().unwrap().as_str(), "5.0.0-rc.0");
    }

    #[test]
    fn test_latest_on_empty_catalog() {
        let catalog = catalog(&["main", "v2"]);
        assert!(catalog.is_empty());
        assert_matches!(catalog.latest(), Err(RepoError::EmptyCatalog { .. }));
    }

    #[test]
    fn test_renderings() {
        let catalog = catalog(&["8.2.10", "9.0.0-alpha.1"]);

        assert_eq!(catalog.render_plain(), b"9.0.0-alpha.1\n8.2.10\n".to_vec());
        assert_eq!(
            catalog.render_annotated(),
            b"v9 9.0 9.0.0-alpha.1\nv8 8.2 8.2.10\n".to_vec()
        );
    }

    #[test]
    fn test_load_from_repository() {
        let runner = Rc::new(ScriptedRunner::new().on(
            "/srv/repo",
            "git tag",
            "0.9.0\n1.0.0\nnightly\n1.1.0-beta.0\n",
        ));
        let root = RepoHandle::root("/srv/repo", None, runner);

        let catalog = VersionCatalog::load(&root).unwrap();
        assert_eq!(listed(&catalog), vec!["1.1.0-beta.0", "1.0.0", "0.9.0"]);
    }
}
