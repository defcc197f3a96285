use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::Drawable,
    Connection, Extension,
};

use super::ActivityProbe;

/// Reads idle time from the MIT-SCREEN-SAVER extension.
pub struct X11Probe {
    connection: Connection,
    preferred_screen: i32,
}

impl X11Probe {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) =
            Connection::connect_with_extensions(None, &[Extension::ScreenSaver], &[])?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }
}

impl ActivityProbe for X11Probe {
    #[instrument(skip(self))]
    fn idle_time(&mut self) -> Result<Duration> {
        let root = self
            .connection
            .get_setup()
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .ok_or_else(|| anyhow!("X11 screen {} not found", self.preferred_screen))?
            .root();
        let cookie = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(cookie)?;
        Ok(Duration::from_millis(reply.ms_since_user_input() as u64))
    }
}
