//! Domain identifiers (strongly-typed IDs).
//!
//! # 2 種類の ID
//! - **ItemId**: 延期レコードの ID。生成は `IdGenerator` が担当し、
//!   永続化・プロトコル上は単なる文字列として扱う
//! - **Handle<T>**: ホスト（ブラウザ）が払い出す数値ハンドル。
//!   タブとウィンドウを Phantom type で区別する
//!
//! ## Phantom Type パターン
//! `Handle<T>` は共通実装を 1 つだけ持ち、`T` はコンパイル時の区別にだけ使う。
//! `SourceRef` と `WindowId` は同じ u64 でも混同できない。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Identifier of a deferred item.
///
/// Opaque to everything except `IdGenerator`; records loaded from storage or
/// received over the protocol may carry any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HandleMarker は各ハンドル型のマーカー trait
///
/// Display で使うプレフィックス（"tab-", "window-"）を提供します。
pub trait HandleMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ホストが払い出す数値ハンドル
///
/// シリアライズ時は素の数値になる（ホスト API と同じ形）。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle<T: HandleMarker> {
    value: u64,
    _marker: PhantomData<T>,
}

impl<T: HandleMarker> Handle<T> {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

impl<T: HandleMarker> From<u64> for Handle<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T: HandleMarker> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

/// Tab のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tab {}

impl HandleMarker for Tab {
    fn prefix() -> &'static str {
        "tab-"
    }
}

/// Window のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {}

impl HandleMarker for Window {
    fn prefix() -> &'static str {
        "window-"
    }
}

/// Reference to the originating tab. May dangle once the tab is closed.
pub type SourceRef = Handle<Tab>;

/// Window a tab belonged to; used only for best-effort placement on restore.
pub type WindowId = Handle<Window>;
