use std::env;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use super::PasteInjector;
use super::backend::{ClipboardAccess, ClipboardBackend};
use crate::error::PasteError;

/// External tool that sends the paste keystroke to the focused window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystrokeTool {
    /// Wayland: `wtype`
    Wtype,
    /// X11: `xdotool`
    Xdotool,
    /// macOS: System Events via `osascript`
    Osascript,
    /// Windows: `SendKeys` via PowerShell
    SendKeys,
}

impl KeystrokeTool {
    /// Pick the keystroke tool for this platform and session
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(KeystrokeTool::Osascript)
        } else if cfg!(windows) {
            Some(KeystrokeTool::SendKeys)
        } else if env::var("WAYLAND_DISPLAY").is_ok() {
            Some(KeystrokeTool::Wtype)
        } else if env::var("DISPLAY").is_ok() {
            Some(KeystrokeTool::Xdotool)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeystrokeTool::Wtype => "wtype",
            KeystrokeTool::Xdotool => "xdotool",
            KeystrokeTool::Osascript => "osascript",
            KeystrokeTool::SendKeys => "powershell",
        }
    }

    /// Command that waits `delay` and then sends the paste keystroke
    ///
    /// The wait happens in the child so the caller never blocks and the
    /// focus has time to return to the target window.
    pub fn command(self, delay: Duration) -> Command {
        let secs = delay.as_secs_f64();
        match self {
            KeystrokeTool::Wtype => shell(format!("sleep {} && exec wtype -M ctrl v -m ctrl", secs)),
            KeystrokeTool::Xdotool => shell(format!(
                "sleep {} && exec xdotool key --clearmodifiers ctrl+v",
                secs
            )),
            KeystrokeTool::Osascript => shell(format!(
                "sleep {} && exec osascript -e 'tell application \"System Events\" to keystroke \"v\" using command down'",
                secs
            )),
            KeystrokeTool::SendKeys => {
                let mut cmd = Command::new("powershell");
                cmd.arg("-NoProfile").arg("-Command").arg(format!(
                    "Start-Sleep -Milliseconds {}; (New-Object -ComObject WScript.Shell).SendKeys('^v')",
                    delay.as_millis()
                ));
                cmd
            }
        }
    }
}

fn shell(script: String) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

/// Reap a detached child without blocking the caller
fn reap(mut child: Child) {
    std::thread::spawn(move || {
        let _ = child.wait();
    });
}

/// Places content on the clipboard, then simulates the paste keystroke
pub struct SystemPaste {
    clipboard: Mutex<ClipboardAccess>,
    keystroke: Option<KeystrokeTool>,
    delay: Duration,
}

impl SystemPaste {
    pub fn new(backend: ClipboardBackend, keystroke: Option<KeystrokeTool>, delay: Duration) -> Self {
        SystemPaste {
            clipboard: Mutex::new(ClipboardAccess::new(backend)),
            keystroke,
            delay,
        }
    }

    /// Injector for the current session
    pub fn detect(backend: ClipboardBackend, delay: Duration) -> Self {
        let keystroke = KeystrokeTool::detect();
        match keystroke {
            Some(tool) => log::info!("Paste keystrokes via {}", tool.name()),
            None => log::warn!("No paste keystroke tool for this session; selections are only copied"),
        }
        Self::new(backend, keystroke, delay)
    }
}

impl PasteInjector for SystemPaste {
    fn inject_paste(&self, content: &str) -> Result<(), PasteError> {
        {
            let mut clipboard = self
                .clipboard
                .lock()
                .map_err(|_| PasteError::Clipboard("clipboard lock poisoned".to_string()))?;
            clipboard.write_text(content)?;
        }

        let tool = self.keystroke.ok_or(PasteError::Unsupported)?;
        let child = tool
            .command(self.delay)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PasteError::Spawn {
                tool: tool.name(),
                source,
            })?;
        reap(child);

        log::debug!(
            "Scheduled paste via {} after {}ms delay",
            tool.name(),
            self.delay.as_millis()
        );
        Ok(())
    }

    fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_wtype_command_sleeps_then_pastes() {
        let cmd = KeystrokeTool::Wtype.command(Duration::from_millis(100));
        assert_eq!(cmd.get_program(), "sh");
        assert_eq!(
            args(&cmd),
            vec!["-c", "sleep 0.1 && exec wtype -M ctrl v -m ctrl"]
        );
    }

    #[test]
    fn test_xdotool_command_clears_modifiers() {
        let cmd = KeystrokeTool::Xdotool.command(Duration::from_millis(250));
        let script = args(&cmd).pop().unwrap();
        assert!(script.starts_with("sleep 0.25 && "));
        assert!(script.contains("--clearmodifiers ctrl+v"));
    }

    #[test]
    fn test_sendkeys_command_uses_milliseconds() {
        let cmd = KeystrokeTool::SendKeys.command(Duration::from_millis(100));
        assert_eq!(cmd.get_program(), "powershell");
        assert!(args(&cmd).last().unwrap().starts_with("Start-Sleep -Milliseconds 100;"));
    }
}
