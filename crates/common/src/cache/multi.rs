//! Ordered stack of cache tiers.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::service::SourceLink;

use super::{CacheEntry, CacheError, CacheKey, Tier};

/// Tiers in lookup order, highest priority first. Writes always land in
/// the first writeable tier.
#[derive(Debug, Clone)]
pub struct MultiCache {
    tiers: Vec<Tier>,
}

impl MultiCache {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// First verified hit across the tiers.
    pub fn get(&self, id: Uuid) -> Result<Option<PathBuf>, CacheError> {
        for tier in &self.tiers {
            if let Some(path) = tier.get(id)? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    pub fn put_file(&self, key: &CacheKey, from: &Path) -> Result<PathBuf, CacheError> {
        self.writeable_tier()?.put_file(key, from)
    }

    /// Cached path for a source, downloading through its signed link on a
    /// miss. The download streams into a staging file and only becomes
    /// visible once its checksum matches the catalog record.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        link: &SourceLink,
    ) -> Result<PathBuf, CacheError> {
        let key = CacheKey::from(link);
        if let Some(path) = self.get(key.id)? {
            return Ok(path);
        }
        if !link.available {
            return Err(CacheError::NotAvailable(link.name.clone()));
        }

        let tier = self.writeable_tier()?;
        let mut staged = tier.stage()?;
        let mut response = client
            .get(link.url.clone())
            .send()
            .await?
            .error_for_status()?;
        while let Some(chunk) = response.chunk().await? {
            staged.write_all(&chunk)?;
        }
        staged.flush()?;
        tier.commit(&key, staged)
    }

    /// Evict from every writeable tier.
    pub fn evict(&self, id: Uuid) -> Result<bool, CacheError> {
        let mut hit = false;
        for tier in self.tiers.iter().filter(|t| t.writeable()) {
            hit |= tier.evict(id)?;
        }
        Ok(hit)
    }

    /// Clear every writeable tier; returns how many entries went away.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let mut total = 0;
        for tier in self.tiers.iter().filter(|t| t.writeable()) {
            total += tier.clear()?;
        }
        Ok(total)
    }

    /// Union of the tier indexes, first tier winning on duplicates.
    pub fn entries(&self) -> Result<Vec<(Uuid, CacheEntry)>, CacheError> {
        let mut seen: BTreeSet<Uuid> = BTreeSet::new();
        let mut out = Vec::new();
        for tier in &self.tiers {
            for (id, entry) in tier.entries()? {
                if seen.insert(id) {
                    out.push((id, entry));
                }
            }
        }
        Ok(out)
    }

    fn writeable_tier(&self) -> Result<&Tier, CacheError> {
        self.tiers
            .iter()
            .find(|t| t.writeable())
            .ok_or(CacheError::NotWriteable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;

    fn key(name: &str, bytes: &[u8]) -> CacheKey {
        CacheKey {
            id: Uuid::new_v4(),
            name: name.to_string(),
            size: bytes.len() as u64,
            checksum: Checksum::sha256_of(bytes),
        }
    }

    #[test]
    fn lookup_falls_through_tiers() {
        let shared = tempfile::tempdir().unwrap();
        let private = tempfile::tempdir().unwrap();

        // seed the shared tier through a writeable handle, then stack it
        // read-only behind the private tier
        let seeder = Tier::open(shared.path(), true).unwrap();
        let body = b"shared bytes";
        let shared_key = key("shared.fits", body);
        seeder.put_bytes(&shared_key, body).unwrap();

        let cache = MultiCache::new(vec![
            Tier::open(private.path(), true).unwrap(),
            Tier::open(shared.path(), false).unwrap(),
        ]);

        assert!(cache.get(shared_key.id).unwrap().is_some());
        assert!(cache.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn writes_land_in_first_writeable_tier() {
        let shared = tempfile::tempdir().unwrap();
        let private = tempfile::tempdir().unwrap();
        let cache = MultiCache::new(vec![
            Tier::open(shared.path(), false).unwrap(),
            Tier::open(private.path(), true).unwrap(),
        ]);

        let body = b"private bytes";
        let k = key("mine.h5", body);
        let from = private.path().join("incoming");
        std::fs::write(&from, body).unwrap();
        let stored = cache.put_file(&k, &from).unwrap();
        assert!(stored.starts_with(private.path()));

        assert!(cache.evict(k.id).unwrap());
        assert!(cache.get(k.id).unwrap().is_none());
    }
}
