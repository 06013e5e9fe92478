#![cfg(unix)]

use git2::{Repository, RepositoryInitOptions};
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(20);

fn staged_repo(dir: &Path) {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = Repository::init_opts(dir, &options).unwrap();
    std::fs::write(dir.join("a.txt"), "a").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("a.txt")).unwrap();
    index.write().unwrap();
}

/// everything the terminal printed so far
#[derive(Clone, Default)]
struct Screen(Arc<Mutex<String>>);

impl Screen {
    fn follow(&self, mut reader: Box<dyn Read + Send>) {
        let screen = self.0.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while let Ok(n) = reader.read(&mut buf) {
                if n == 0 {
                    break;
                }
                screen
                    .lock()
                    .unwrap()
                    .push_str(&String::from_utf8_lossy(&buf[..n]));
            }
        });
    }

    /// wait for `needle` printed after byte `from`, returning the end of the match
    fn wait_for(&self, needle: &str, from: usize) -> usize {
        let start = Instant::now();
        loop {
            {
                let text = self.0.lock().unwrap();
                if let Some(pos) = text.get(from..).and_then(|rest| rest.find(needle)) {
                    return from + pos + needle.len();
                }
                if start.elapsed() > TIMEOUT {
                    panic!("`{needle}` never showed up, screen was:\n{text}");
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

#[test]
fn ctrl_c_steps_back_instead_of_killing_the_wizard() {
    let home = tempfile::tempdir().unwrap();
    let repo_dir = tempfile::tempdir().unwrap();
    staged_repo(repo_dir.path());

    let pair = native_pty_system()
        .openpty(PtySize {
            rows: 40,
            cols: 120,
            pixel_width: 0,
            pixel_height: 0,
        })
        .unwrap();
    let mut cmd = CommandBuilder::new(env!("CARGO_BIN_EXE_gitmoji-wizard"));
    cmd.arg("commit");
    cmd.arg("--repo");
    cmd.arg(repo_dir.path());
    cmd.env("GITMOJI_WIZARD_HOME", home.path());
    cmd.env("TERM", "xterm-256color");
    let mut child = pair.slave.spawn_command(cmd).unwrap();
    drop(pair.slave);

    let screen = Screen::default();
    screen.follow(pair.master.try_clone_reader().unwrap());
    let mut keys = pair.master.take_writer().unwrap();
    let mut press = |bytes: &[u8]| {
        // let the prompt switch the terminal to raw mode first
        thread::sleep(Duration::from_millis(300));
        keys.write_all(bytes).unwrap();
        keys.flush().unwrap();
    };

    let at = screen.wait_for("select gitmoji:", 0);
    press(b"\r");
    let at = screen.wait_for("scope (optional):", at);
    press(b"\x03");

    // back on the emoji prompt, still running
    let at = screen.wait_for("select gitmoji:", at);
    assert!(child.try_wait().unwrap().is_none());

    // ctrl+c on the first prompt offers a restart, q quits
    press(b"\x03");
    screen.wait_for("press enter to restart", at);
    press(b"q\r");

    let deadline = Instant::now() + TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("gitmoji-wizard did not quit after `q`");
        }
        thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success());

    let repo = Repository::open(repo_dir.path()).unwrap();
    assert!(repo.head().is_err());
}
