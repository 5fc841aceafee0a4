//! Makes the I2C bus usable, the same way the `gpio load i2c` utility does.

use std::fs;
use std::io;
use std::os::unix::fs::chown;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

const MODULES: &str = "/proc/modules";
const I2C_DEV: &str = "i2c_dev";
/// Bus controller drivers; the first is what older kernels ship.
const CONTROLLERS: [&str; 2] = ["i2c_bcm2708", "i2c_bcm2835"];
const NODES: [&str; 2] = ["/dev/i2c-0", "/dev/i2c-1"];

/// `/proc/modules` has one module per line; any line mentioning `name` counts.
pub fn mentions(modules: &str, name: &str) -> bool {
    modules.lines().any(|line| line.contains(name))
}

/// The kernel's module list and loader.
pub trait Modules {
    /// Contents of `/proc/modules`.
    fn loaded(&self) -> Result<String>;
    /// Tries to load `name`. Failures are only logged; callers check `loaded` afterwards.
    fn load(&self, name: &str);
}

/// `/proc/modules` and `modprobe`.
pub struct Kernel;

impl Modules for Kernel {
    fn loaded(&self) -> Result<String> {
        fs::read_to_string(MODULES).map_err(|e| Error::unavailable(MODULES, e))
    }

    fn load(&self, name: &str) {
        info!("loading kernel module {}", name);
        match Command::new("modprobe").arg(name).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("modprobe {} exited with {}", name, status),
            Err(e) => warn!("can't run modprobe {}: {}", name, e),
        }
    }
}

/// Makes sure `i2c_dev` and one bus controller driver are loaded, trying the
/// controllers in order until one sticks.
pub fn load_modules<M: Modules>(modules: &M) -> Result<()> {
    if !mentions(&modules.loaded()?, I2C_DEV) {
        modules.load(I2C_DEV);
    }

    let controller_loaded = |list: &str| CONTROLLERS.iter().any(|c| mentions(list, c));
    if controller_loaded(&modules.loaded()?) {
        return Ok(());
    }
    for controller in CONTROLLERS.iter() {
        modules.load(controller);
        if controller_loaded(&modules.loaded()?) {
            return Ok(());
        }
    }
    Err(Error::Setup(format!("Unable to load {} module", CONTROLLERS[0])))
}

/// Loads the I2C modules if needed and hands the bus nodes to the real user.
pub fn i2c() -> Result<()> {
    load_modules(&Kernel)?;

    // give udev a moment to create the nodes
    thread::sleep(Duration::from_secs(1));

    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    for node in NODES.iter() {
        change_owner(Path::new(node), uid, gid)?;
    }
    Ok(())
}

pub fn change_owner(path: &Path, uid: u32, gid: u32) -> Result<()> {
    chown(path, Some(uid), Some(gid)).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::Setup(format!("File {} not present", path.display()))
        } else {
            Error::Setup(format!("Unable to change ownership of {}: {}", path.display(), e))
        }
    })
}

#[cfg(test)]
pub mod mock {
    use std::cell::RefCell;

    use super::*;

    /// Keeps a module list in memory. Loading a module listed in `loadable` adds it.
    #[derive(Default)]
    pub struct MockModules {
        pub list: RefCell<Vec<String>>,
        pub loadable: Vec<&'static str>,
        pub attempts: RefCell<Vec<String>>,
    }

    impl MockModules {
        pub fn new(loaded: &[&str], loadable: &[&'static str]) -> MockModules {
            MockModules {
                list: RefCell::new(loaded.iter().map(|m| m.to_string()).collect()),
                loadable: loadable.to_vec(),
                attempts: RefCell::default(),
            }
        }
    }

    impl Modules for MockModules {
        fn loaded(&self) -> Result<String> {
            let list = self.list.borrow();
            Ok(list.iter().map(|m| format!("{} 16384 0 - Live 0x0\n", m)).collect())
        }

        fn load(&self, name: &str) {
            self.attempts.borrow_mut().push(name.to_owned());
            if self.loadable.iter().any(|m| *m == name) {
                self.list.borrow_mut().push(name.to_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockModules;
    use super::*;

    const LOADED: &str = "\
i2c_bcm2835 16384 0 - Live 0x0000000000000000
i2c_dev 20480 0 - Live 0x0000000000000000
snd_bcm2835 24576 1 - Live 0x0000000000000000
";

    #[test]
    fn finds_modules_by_substring() {
        assert!(mentions(LOADED, "i2c_dev"));
        assert!(mentions(LOADED, "i2c_bcm2835"));
        assert!(mentions(LOADED, "bcm2835"));
        assert!(!mentions(LOADED, "i2c_bcm2708"));
        assert!(!mentions("", "i2c_dev"));
    }

    #[test]
    fn nothing_to_load() {
        let modules = MockModules::new(&["i2c_dev", "i2c_bcm2708"], &[]);
        load_modules(&modules).unwrap();
        assert!(modules.attempts.borrow().is_empty());
    }

    #[test]
    fn missing_i2c_dev_is_loaded() {
        let modules = MockModules::new(&["i2c_bcm2835"], &["i2c_dev"]);
        load_modules(&modules).unwrap();
        assert_eq!(*modules.attempts.borrow(), vec!["i2c_dev"]);
    }

    #[test]
    fn controllers_are_tried_until_one_loads() {
        let modules = MockModules::new(&["i2c_dev"], &["i2c_bcm2708", "i2c_bcm2835"]);
        load_modules(&modules).unwrap();
        assert_eq!(*modules.attempts.borrow(), vec!["i2c_bcm2708"]);

        let modules = MockModules::new(&[], &["i2c_dev", "i2c_bcm2835"]);
        load_modules(&modules).unwrap();
        assert_eq!(*modules.attempts.borrow(), vec!["i2c_dev", "i2c_bcm2708", "i2c_bcm2835"]);
    }

    #[test]
    fn no_controller_is_fatal() {
        let modules = MockModules::new(&["i2c_dev"], &[]);
        let err = load_modules(&modules).unwrap_err();
        assert_eq!(err.to_string(), "Unable to load i2c_bcm2708 module");
        assert_eq!(*modules.attempts.borrow(), vec!["i2c_bcm2708", "i2c_bcm2835"]);
    }

    #[test]
    fn missing_node_is_reported_as_not_present() {
        let err = change_owner(Path::new("/dev/i2c-does-not-exist"), 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "File /dev/i2c-does-not-exist not present");
    }
}
