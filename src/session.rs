//! 引き継ぎレコードの保存
//!
//! 撮影フローから結果ビューへ ScanResult を渡すための小さなキー付きJSON。
//! 読み出しと同時に削除する（1回だけ消費される）。

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SESSION_FILE_NAME: &str = "session.json";

/// 引き継ぎレコードのキー
pub const SCAN_RESULT_KEY: &str = "scanResult";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    /// バージョン（互換性チェック用）
    version: u32,
    entries: BTreeMap<String, serde_json::Value>,
}

impl SessionFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// セッションストア
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 読めない・壊れたファイルは空として扱う
    fn load(&self) -> SessionFile {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return SessionFile::default(),
        };

        match serde_json::from_reader::<_, SessionFile>(BufReader::new(file)) {
            Ok(session) if session.version == SessionFile::CURRENT_VERSION => session,
            Ok(_) => {
                warn!("セッションのバージョン不一致、破棄します");
                SessionFile::default()
            }
            Err(e) => {
                warn!("セッションファイルを読めません: {}", e);
                SessionFile::default()
            }
        }
    }

    fn save(&self, session: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, session)?;
        Ok(())
    }

    /// 値を書き込む（同じキーは上書き）
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut session = self.load();
        session.entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.save(&session)?;
        debug!(key, path = %self.path.display(), "セッションに保存");
        Ok(())
    }

    /// 値を読む（削除しない）
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.load().entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 値を読んで削除する
    ///
    /// 型に合わない値は無いものとして扱い、ファイルには残す
    pub fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut session = self.load();
        let Some(value) = session.entries.get(key) else {
            return Ok(None);
        };
        let decoded = match T::deserialize(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(key, "セッションの値を解釈できません: {}", e);
                return Ok(None);
            }
        };

        session.entries.remove(key);
        self.save(&session)?;
        debug!(key, "セッションから取り出し");
        Ok(Some(decoded))
    }

    /// セッションを削除
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
