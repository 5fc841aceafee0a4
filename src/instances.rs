use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Longest command name the kernel keeps in `/proc/<pid>/stat` (TASK_COMM_LEN - 1).
const COMM_LEN: usize = 15;
/// How long a signalled instance gets to clear its LEDs and exit.
const EXIT_GRACE: Duration = Duration::from_secs(2);
const EXIT_POLL: Duration = Duration::from_millis(20);

/// Finds and stops other copies of this program.
pub trait InstanceRegistry {
    /// Returns how many other instances were signalled. Returns once they have exited,
    /// or after a grace period if some are still around.
    fn find_and_terminate_others(&self, current: u32, program: &str) -> Result<usize>;
}

/// The process table under `/proc`.
#[derive(Debug, Clone)]
pub struct ProcTable {
    root: PathBuf,
}

impl Default for ProcTable {
    fn default() -> ProcTable {
        ProcTable::new("/proc")
    }
}

/// The command name in a `/proc/<pid>/stat` line: `1234 (name) S 1 ...`.
///
/// Names may themselves contain spaces and parentheses, so everything between the
/// first `(` and the last `)` is taken.
pub fn command_name(stat: &str) -> Result<&str> {
    match (stat.find('('), stat.rfind(')')) {
        (Some(open), Some(close)) if open < close => Ok(&stat[open + 1..close]),
        _ => Err(Error::parse("process stat", stat.trim().to_owned())),
    }
}

/// What `name` looks like once the kernel has truncated it to fit the comm field.
pub fn comm(name: &str) -> &str {
    if name.len() <= COMM_LEN {
        return name;
    }
    let mut end = COMM_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

impl ProcTable {
    pub fn new<P: Into<PathBuf>>(root: P) -> ProcTable {
        ProcTable { root: root.into() }
    }

    /// Pids other than `current` whose command name is `program`.
    pub fn others(&self, current: u32, program: &str) -> Result<Vec<u32>> {
        let wanted = comm(program);
        let entries = fs::read_dir(&self.root).map_err(|e| Error::unavailable(self.root.clone(), e))?;

        let mut pids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::unavailable(self.root.clone(), e))?;
            let pid: u32 = match entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                Some(pid) => pid,
                None => continue,
            };
            if pid == current {
                continue;
            }

            let path = entry.path().join("stat");
            let stat = match fs::read_to_string(&path) {
                Ok(stat) => stat,
                // exited between readdir and open
                Err(ref e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) if e.raw_os_error() == Some(libc::ESRCH) => continue,
                Err(e) => return Err(Error::unavailable(path, e)),
            };
            if command_name(&stat)? == wanted {
                pids.push(pid);
            }
        }
        pids.sort();
        Ok(pids)
    }

    /// Waits until none of `pids` has an entry in the table any more. Returns false
    /// if some were still running after `timeout`.
    pub fn wait_for_exit(&self, pids: &[u32], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let running = pids
                .iter()
                .filter(|pid| self.root.join(pid.to_string()).exists())
                .count();
            if running == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                warn!("{} instance(s) still running after {:?}", running, timeout);
                return false;
            }
            thread::sleep(EXIT_POLL);
        }
    }
}

impl InstanceRegistry for ProcTable {
    fn find_and_terminate_others(&self, current: u32, program: &str) -> Result<usize> {
        let pids = self.others(current, program)?;
        for &pid in &pids {
            info!("terminating running instance {}", pid);
            if unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) } != 0 {
                warn!("can't signal {}: {}", pid, io::Error::last_os_error());
            }
        }
        self.wait_for_exit(&pids, EXIT_GRACE);
        Ok(pids.len())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{tempdir, TempDir};

    use super::*;

    /// A throwaway process table. An empty stat leaves the pid directory without one.
    fn fake_proc(processes: &[(&str, &str)]) -> TempDir {
        let root = tempdir().unwrap();
        for &(dir, stat) in processes {
            let dir = root.path().join(dir);
            fs::create_dir_all(&dir).unwrap();
            if !stat.is_empty() {
                fs::write(dir.join("stat"), stat).unwrap();
            }
        }
        fs::write(root.path().join("uptime"), "1.0 1.0\n").unwrap();
        root
    }

    #[test]
    fn parses_command_names() {
        assert_eq!(command_name("1 (init) S 0 1 1").unwrap(), "init");
        assert_eq!(command_name("42 (tmux: server) S 1").unwrap(), "tmux: server");
        assert_eq!(command_name("7 (a) b) R 1").unwrap(), "a) b");
        assert!(matches!(command_name("garbage"), Err(Error::Parse { .. })));
        assert!(command_name("1 )x( S").is_err());
    }

    #[test]
    fn long_names_are_truncated_like_the_kernel() {
        assert_eq!(comm("glowmon"), "glowmon");
        assert_eq!(comm("a-very-long-program-name"), "a-very-long-pro");
    }

    #[test]
    fn finds_other_instances_only() {
        let fake = fake_proc(&[
            ("1", "1 (init) S 0"),
            ("200", "200 (glowmon) S 1"),
            ("300", "300 (glowmon) S 1"),
            ("400", "400 (glowmon-old) S 1"),
            ("self", ""),
            ("500", ""),
        ]);
        let table = ProcTable::new(fake.path());
        assert_eq!(table.others(300, "glowmon").unwrap(), vec![200]);
        assert_eq!(table.others(1, "glowmon").unwrap(), vec![200, 300]);
        assert!(table.others(1, "nothing").unwrap().is_empty());
    }

    #[test]
    fn malformed_stat_is_a_parse_error() {
        let fake = fake_proc(&[("9", "9 glowmon S 1")]);
        let table = ProcTable::new(fake.path());
        assert!(matches!(table.others(1, "glowmon"), Err(Error::Parse { .. })));
    }

    #[test]
    fn missing_table_is_unavailable() {
        let table = ProcTable::new("/nonexistent/proc");
        assert!(matches!(table.others(1, "glowmon"), Err(Error::Unavailable { .. })));
    }

    #[test]
    fn nothing_to_terminate() {
        let fake = fake_proc(&[("1", "1 (init) S 0")]);
        let table = ProcTable::new(fake.path());
        assert_eq!(table.find_and_terminate_others(2, "glowmon").unwrap(), 0);
    }

    #[test]
    fn gone_processes_need_no_wait() {
        let fake = fake_proc(&[("1", "1 (init) S 0")]);
        let table = ProcTable::new(fake.path());
        let start = Instant::now();
        assert!(table.wait_for_exit(&[200, 300], Duration::from_secs(5)));
        assert!(table.wait_for_exit(&[], Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn waits_until_the_process_exits() {
        let fake = fake_proc(&[("200", "200 (glowmon) S 1")]);
        let table = ProcTable::new(fake.path());
        let entry = fake.path().join("200");
        let exit = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            fs::remove_dir_all(entry).unwrap();
        });
        assert!(table.wait_for_exit(&[200], Duration::from_secs(5)));
        exit.join().unwrap();
    }

    #[test]
    fn gives_up_after_the_timeout() {
        let fake = fake_proc(&[("200", "200 (glowmon) S 1")]);
        let table = ProcTable::new(fake.path());
        let start = Instant::now();
        assert!(!table.wait_for_exit(&[200], Duration::from_millis(100)));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
