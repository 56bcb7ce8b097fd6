// File: src/store.rs
use crate::core::ngram::RankedProfile;
use crate::core::types::{LanguageCode, Ngram};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// A language code with its reference profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub code: LanguageCode,
    pub profile: RankedProfile,
}

impl LanguageProfile {
    pub fn new(code: impl Into<LanguageCode>, profile: RankedProfile) -> Self {
        Self { code: code.into(), profile }
    }
}

/// Read-only set of reference profiles, ordered by language code.
///
/// Built once and then shared (usually behind an `Arc`) by any number of
/// detectors and threads.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Vec<LanguageProfile>,
    index: HashMap<LanguageCode, usize>,
    max_rank: usize,
}

/// On-disk resource: one language, n-grams in rank order.
/// `ngrams_by_length` holds one ranked list per n-gram length instead.
#[derive(Deserialize)]
struct ProfileResource {
    code: Option<LanguageCode>,
    #[serde(default)]
    ngrams: Vec<Ngram>,
    #[serde(default)]
    ngrams_by_length: BTreeMap<usize, Vec<Ngram>>,
}

/// The serializable state of a loaded store.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    max_rank: usize,
    profiles: Vec<LanguageProfile>,
}

static GLOBAL_STORE: OnceLock<Arc<ProfileStore>> = OnceLock::new();

impl ProfileStore {
    /// Loads every profile resource in `dir`. Both `<dir>/<code>.json` and
    /// `<dir>/<code>/<code>.json` are accepted. Any unreadable or malformed
    /// resource fails the whole load.
    pub fn load_dir(dir: &Path, max_rank: usize) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                let nested = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| resource_path(dir, name));
                match nested {
                    Some(file) if file.is_file() => paths.push(file),
                    _ => warn!(path = %path.display(), "skipping directory without a profile"),
                }
            } else if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            } else {
                warn!(path = %path.display(), "skipping non-JSON file");
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        let mut builder = ProfileStoreBuilder::new(max_rank);
        for path in &paths {
            let (code, ngrams) = read_resource(path)?;
            if builder.contains(&code) {
                return Err(Error::InvalidProfile {
                    path: path.clone(),
                    reason: format!("duplicate language code '{code}'"),
                });
            }
            builder.insert_ranked(code, ngrams);
        }

        let store = builder.build();
        info!(dir = %dir.display(), languages = store.len(), max_rank, "loaded language profiles");
        Ok(store)
    }

    /// Process-wide store, loaded from `dir` on first use. Later calls return the
    /// same instance and ignore their arguments.
    pub fn global(dir: &Path, max_rank: usize) -> Result<Arc<ProfileStore>> {
        if let Some(store) = GLOBAL_STORE.get() {
            return Ok(Arc::clone(store));
        }
        let loaded = Arc::new(Self::load_dir(dir, max_rank)?);
        Ok(Arc::clone(GLOBAL_STORE.get_or_init(|| loaded)))
    }

    /// Writes a bincode snapshot. The file is replaced atomically.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let parent_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let snapshot = Snapshot { max_rank: self.max_rank, profiles: self.profiles.clone() };

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &snapshot)?;
        writer.flush()?;
        drop(writer);
        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;

        info!(path = %path.display(), languages = self.len(), "saved profile snapshot");
        Ok(())
    }

    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = bincode::deserialize_from(reader)?;

        let mut builder = ProfileStoreBuilder::new(snapshot.max_rank);
        for language in snapshot.profiles {
            builder.insert(language.code, language.profile);
        }
        let store = builder.build();
        info!(path = %path.display(), languages = store.len(), "loaded profile snapshot");
        Ok(store)
    }

    pub fn get(&self, code: &str) -> Option<&LanguageProfile> {
        self.index.get(code).map(|&i| &self.profiles[i])
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles.iter().map(|language| language.code.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }
}

/// Collects profiles before freezing them into a `ProfileStore`.
/// Inserting a code twice keeps the last profile.
#[derive(Debug, Default)]
pub struct ProfileStoreBuilder {
    profiles: BTreeMap<LanguageCode, RankedProfile>,
    max_rank: usize,
}

impl ProfileStoreBuilder {
    pub fn new(max_rank: usize) -> Self {
        Self { profiles: BTreeMap::new(), max_rank }
    }

    /// Adds a profile, re-truncated to the store's `max_rank`.
    pub fn insert(&mut self, code: impl Into<LanguageCode>, profile: RankedProfile) -> &mut Self {
        let profile = if profile.max_rank() == self.max_rank {
            profile
        } else {
            RankedProfile::from_ranked(profile.ngrams().iter().cloned(), self.max_rank)
        };
        self.profiles.insert(code.into(), profile);
        self
    }

    /// Adds a profile from n-grams already in rank order.
    pub fn insert_ranked<I, S>(&mut self, code: impl Into<LanguageCode>, ngrams: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Ngram>,
    {
        let profile = RankedProfile::from_ranked(ngrams, self.max_rank);
        self.profiles.insert(code.into(), profile);
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.profiles.contains_key(code)
    }

    pub fn build(self) -> ProfileStore {
        let profiles: Vec<LanguageProfile> = self
            .profiles
            .into_iter()
            .map(|(code, profile)| LanguageProfile { code, profile })
            .collect();
        let index = profiles
            .iter()
            .enumerate()
            .map(|(i, language)| (language.code.clone(), i))
            .collect();
        ProfileStore { profiles, index, max_rank: self.max_rank }
    }
}

/// Parses one resource file into its code and combined ranked n-gram list.
fn read_resource(path: &Path) -> Result<(LanguageCode, Vec<Ngram>)> {
    let reader = BufReader::new(File::open(path)?);
    let resource: ProfileResource = serde_json::from_reader(reader)
        .map_err(|source| Error::Json { path: path.to_path_buf(), source })?;

    let invalid = |reason: &str| Error::InvalidProfile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let code = match resource.code {
        Some(code) => code,
        None => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| invalid("cannot derive a language code from the file name"))?,
    };
    if code.trim().is_empty() {
        return Err(invalid("empty language code"));
    }

    let ngrams = if resource.ngrams.is_empty() {
        merge_by_rank(resource.ngrams_by_length)
    } else {
        resource.ngrams
    };
    if ngrams.is_empty() {
        return Err(invalid("profile has no n-grams"));
    }
    Ok((code, ngrams))
}

/// Interleaves per-length lists rank by rank: every length's rank 1, then every
/// length's rank 2, and so on.
fn merge_by_rank(lists: BTreeMap<usize, Vec<Ngram>>) -> Vec<Ngram> {
    let mut iters: Vec<_> = lists.into_values().map(Vec::into_iter).collect();
    let mut merged = Vec::new();
    loop {
        let before = merged.len();
        merged.extend(iters.iter_mut().filter_map(Iterator::next));
        if merged.len() == before {
            return merged;
        }
    }
}

/// Path of the conventional nested resource for `code` under `dir`.
pub fn resource_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(code).join(format!("{code}.json"))
}
