use std::io;

use lead_chat_core::hand_off::LinkOpener;

/// Opens hand-off links with the system's default browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserOpener;

impl LinkOpener for BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        debug!("launching browser for {url}");
        open::that_detached(url)
    }
}
