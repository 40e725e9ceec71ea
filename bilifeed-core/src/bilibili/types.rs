//! Bilibili API wire structures

use serde::Deserialize;

/// Archive-cursor listing response (`/x/v2/space/archive/cursor`)
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveResp {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<ArchiveData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveData {
    #[serde(default)]
    pub item: Vec<ArchiveItem>,
}

/// One raw archive item. `param` carries the numeric video id as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveItem {
    #[serde(default)]
    pub param: String,
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub ctime: i64,
    #[serde(default)]
    pub play: u64,
    #[serde(default)]
    pub danmaku: u64,
}

/// Video metadata view response (`/x/web-interface/view`)
#[derive(Debug, Clone, Deserialize)]
pub struct ViewResp {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<ViewData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewData {
    pub aid: u64,
    pub bvid: String,
    pub title: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub pubdate: i64,
    pub owner: ViewOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewOwner {
    pub mid: u64,
    pub name: String,
    #[serde(default)]
    pub face: String,
}
