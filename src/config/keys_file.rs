use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::account::{Account, Role};

/// TOML list of fuzz account secrets, as written by `create`.
///
/// ```toml
/// keys = ["0x…", "0x…"]
/// ```
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct KeysFile {
    pub keys: Vec<String>,
}

impl KeysFile {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        Self { keys: accounts.iter().map(Account::secret_hex).collect() }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let file: KeysFile = toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(file)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    /// The first `count` keys as fuzz accounts.
    pub fn accounts(&self, count: usize) -> Result<Vec<Account>> {
        if self.keys.len() < count {
            anyhow::bail!("keys file holds {} keys, {} requested", self.keys.len(), count);
        }
        self.keys
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, k)| Account::from_hex(k, Role::Fuzz).with_context(|| format!("key #{i}")))
            .collect()
    }
}
