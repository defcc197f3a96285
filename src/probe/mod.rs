//! Idle-time sources of the different desktop environments. [GenericProbe] picks the one the
//! crate was built for.

#[cfg(any(target_os = "macos", test))]
pub mod macos;
#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::time::Duration;

use anyhow::Result;

/// Contract every platform has to implement for the sampler.
#[cfg_attr(test, mockall::automock)]
pub trait ActivityProbe {
    /// Time since the last keyboard or mouse input.
    fn idle_time(&mut self) -> Result<Duration>;
}

/// Cross-platform [ActivityProbe].
pub struct GenericProbe {
    inner: Box<dyn ActivityProbe>,
}

impl GenericProbe {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                Ok(Self {
                    inner: Box::new(win::WindowsProbe::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                Ok(Self {
                    inner: Box::new(x11::X11Probe::new()?),
                })
            }
            else if #[cfg(target_os = "macos")] {
                Ok(Self {
                    inner: Box::new(macos::IoregProbe),
                })
            }
            else {
                anyhow::bail!("No activity probe for this platform, build with the `x11` or `win` feature")
            }
        }
    }
}

impl ActivityProbe for GenericProbe {
    fn idle_time(&mut self) -> Result<Duration> {
        self.inner.idle_time()
    }
}
