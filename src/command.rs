//! The `post` entry point's target selector and the closed set of
//! completion-tag callbacks each lane recognizes.
//!
//! The original design selects callbacks by string name at the producer
//! boundary (queues are stringly typed for serialization convenience) but
//! dispatches on a closed set internally. `FileCompletion` / `HttpCompletion`
//! are that closed set; [`FileCompletion::parse`] / [`HttpCompletion::parse`]
//! are the only place a tag string is matched.

/// Which lane a [`crate::DataRunloop::post`] call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    /// Accepted and ignored; no queue backs it.
    None,
    /// The `nbio` file-read lane.
    File,
    /// Accepted and ignored as a queue target; the image sub-lane is only
    /// ever reached by the file lane's `MenuWallpaper` bridge, never posted
    /// to directly.
    Image,
    /// The HTTP transfer lane.
    Http,
    /// Accepted and ignored; the overlay driver is stepped unconditionally
    /// every tick, not queued.
    Overlay,
}

/// Completion callback selected by a file-lane command's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileCompletion {
    /// Mark the task finished and drop the bytes. The default when no tag,
    /// or an unrecognized tag, is given.
    #[default]
    Default,
    /// Bridge to the image sub-lane: decode the bytes as a PNG and install
    /// the result as the background wallpaper.
    MenuWallpaper,
}

impl FileCompletion {
    /// Parse a completion tag, as split out of a `"path|tag"` command.
    /// Unrecognized tags fall back to `Default`, matching the original's
    /// "unknown tag selects the default sink" policy.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag {
            Some("cb_menu_wallpaper") => Self::MenuWallpaper,
            _ => Self::Default,
        }
    }
}

/// Completion callback selected by an HTTP-lane command's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpCompletion {
    /// No sink is registered for this tag; the body is fetched and dropped.
    #[default]
    Drop,
    /// Dispatch the body to the updater's download sink.
    CoreUpdaterDownload,
    /// Dispatch the body to the updater's list sink.
    CoreUpdaterList,
}

impl HttpCompletion {
    /// Parse a completion tag, as split out of a `"url|tag"` command.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag {
            Some("cb_core_updater_download") => Self::CoreUpdaterDownload,
            Some("cb_core_updater_list") => Self::CoreUpdaterList,
            _ => Self::Drop,
        }
    }
}
