//! 已知 EHR 系统表
//!
//! 名称与别名（小写）映射到规范名；按表顺序做双向子串匹配，首个命中者胜出。
//! 表可从 TOML 文件加载，也可在运行时整体替换（SIGHUP 重载、测试注入夹具）。
//!
//! 文件格式：
//!
//! ```toml
//! [[system]]
//! name = "Cerner"
//! aliases = ["Oracle Health"]
//! ```

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::core::BotError;

/// 运行时共享、可重载的系统表
pub type SharedSystems = Arc<RwLock<SystemDirectory>>;

/// 内置 EHR 列表（未配置 systems_file 时使用）
const DEFAULT_SYSTEMS: &[(&str, &[&str])] = &[
    ("Epic", &["EpicCare", "MyChart"]),
    ("Cerner", &["Oracle Health", "PowerChart"]),
    ("Allscripts", &["Veradigm"]),
    ("athenahealth", &["athenaOne", "athenaClinicals"]),
    ("eClinicalWorks", &["eCW"]),
    ("NextGen", &[]),
    ("Greenway", &["Intergy", "Prime Suite"]),
    ("Practice Fusion", &[]),
    ("MEDITECH", &[]),
    ("Amazing Charts", &[]),
    ("Centricity", &["GE Centricity"]),
    ("Kareo", &[]),
];

#[derive(Debug, Deserialize)]
struct SystemsFile {
    #[serde(default)]
    system: Vec<SystemEntry>,
}

#[derive(Debug, Deserialize)]
struct SystemEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// 系统表：有序的 (小写键, 规范名)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemDirectory {
    entries: Vec<(String, String)>,
}

impl SystemDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut dir = Self::new();
        for (name, aliases) in DEFAULT_SYSTEMS {
            dir.insert(name, aliases.iter().copied());
        }
        dir
    }

    /// 登记一个系统及其别名；空白键忽略，重复键保留先登记者
    pub fn insert<'a, I>(&mut self, canonical: &'a str, aliases: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let canonical = canonical.trim();
        if canonical.is_empty() {
            return;
        }
        for key in std::iter::once(canonical).chain(aliases) {
            let key = key.trim().to_lowercase();
            if key.is_empty() || self.entries.iter().any(|(k, _)| *k == key) {
                continue;
            }
            self.entries.push((key, canonical.to_string()));
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BotError> {
        let file: SystemsFile =
            toml::from_str(content).map_err(|e| BotError::SystemsFile(e.to_string()))?;
        let mut dir = Self::new();
        for entry in &file.system {
            dir.insert(&entry.name, entry.aliases.iter().map(String::as_str));
        }
        Ok(dir)
    }

    pub fn load_file(path: &Path) -> Result<Self, BotError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::SystemsFile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 有文件则加载文件，否则用内置表
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, BotError> {
        match path {
            Some(p) => Self::load_file(p),
            None => Ok(Self::with_defaults()),
        }
    }

    /// 整体替换（重载用）
    pub fn replace(&mut self, other: SystemDirectory) {
        self.entries = other.entries;
    }

    /// 双向子串匹配（忽略大小写）：文本包含键，或键包含非空文本
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| needle.contains(key.as_str()) || key.contains(needle.as_str()))
            .map(|(_, canonical)| canonical.as_str())
    }

    pub fn is_known(&self, text: &str) -> bool {
        self.lookup(text).is_some()
    }

    /// 去重后的规范名（保持登记顺序）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, canonical) in &self.entries {
            if !names.contains(&canonical.as_str()) {
                names.push(canonical);
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shared(self) -> SharedSystems {
        Arc::new(RwLock::new(self))
    }
}
