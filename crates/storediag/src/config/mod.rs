//! 配置视图
//!
//! 有序的字符串键值映射。调用方提供初始配置，提供者修补后
//! 产生新的视图，原视图从不被原地修改。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 有序配置映射
///
/// 插入顺序即显示顺序。`get` 对缺失的键返回 `None`，
/// 与空字符串值严格区分。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    entries: IndexMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按键读取，缺失返回 `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// builder 风格的写入
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// 应用覆盖项，返回新的配置视图
    pub fn apply_overrides<I, K, V>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut patched = self.clone();
        for (k, v) in overrides {
            patched.set(k, v);
        }
        patched
    }

    /// 按插入顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conf = Self::new();
        for (k, v) in iter {
            conf.set(k, v);
        }
        conf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_none() {
        let conf = Configuration::new().with("a", "");
        assert_eq!(conf.get("a"), Some(""));
        assert_eq!(conf.get("b"), None);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let conf = Configuration::new()
            .with("z.key", "1")
            .with("a.key", "2")
            .with("m.key", "3");
        let keys: Vec<_> = conf.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z.key", "a.key", "m.key"]);
    }

    #[test]
    fn test_apply_overrides_returns_new_view() {
        let base = Configuration::new().with("k", "old");
        let patched = base.apply_overrides([("k", "new"), ("extra", "1")]);
        // 原视图不变
        assert_eq!(base.get("k"), Some("old"));
        assert_eq!(base.get("extra"), None);
        assert_eq!(patched.get("k"), Some("new"));
        assert_eq!(patched.get("extra"), Some("1"));
    }

    #[test]
    fn test_override_keeps_original_position() {
        let conf = Configuration::new()
            .with("first", "1")
            .with("second", "2")
            .apply_overrides([("first", "updated")]);
        let keys: Vec<_> = conf.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["first", "second"]);
    }
}
