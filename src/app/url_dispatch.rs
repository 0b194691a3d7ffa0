// SPDX-License-Identifier: GPL-3.0-only

//! Opening decoded URLs in the system browser
//!
//! Every frame, each payload starting with `http://` or `https://` is handed
//! to the browser. A URL that stays in view is opened again on every frame
//! unless de-duplication is switched on in the configuration.

use crate::constants::URL_PREFIXES;
use crate::app::frame_processor::DecodedSymbol;
use std::collections::HashSet;
use tracing::{error, info};

/// Something that can open a URL outside the application
pub trait UrlOpener {
    fn open(&mut self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the desktop's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&mut self, url: &str) -> std::io::Result<()> {
        // Detached so a browser that keeps running does not block the frame loop
        open::that_detached(url)
    }
}

/// Whether a payload should be opened in the browser
pub fn is_openable_url(data: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| data.starts_with(prefix))
}

/// Sends URL payloads of each frame's symbols to a [`UrlOpener`]
pub struct UrlDispatcher<O> {
    opener: O,
    enabled: bool,
    /// Payloads already opened; only tracked when de-duplication is on
    opened: Option<HashSet<String>>,
}

impl<O: UrlOpener> UrlDispatcher<O> {
    pub fn new(opener: O, enabled: bool, dedupe: bool) -> Self {
        Self {
            opener,
            enabled,
            opened: dedupe.then(HashSet::new),
        }
    }

    /// Open every URL payload among `symbols`, returning the notices to show
    pub fn dispatch(&mut self, symbols: &[DecodedSymbol]) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }

        let mut notices = Vec::new();
        for symbol in symbols {
            let url = symbol.data.as_str();
            if !is_openable_url(url) {
                continue;
            }
            if let Some(opened) = &mut self.opened
                && !opened.insert(url.to_string())
            {
                continue;
            }

            info!(url = %url, "Opening URL from scanned code");
            notices.push(format!("Opening URL: {}", url));
            if let Err(err) = self.opener.open(url) {
                error!(url = %url, error = %err, "Failed to open URL");
            }
        }
        notices
    }

    #[cfg(test)]
    fn opener(&self) -> &O {
        &self.opener
    }
}
