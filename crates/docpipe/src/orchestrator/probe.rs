use std::path::Path;
use std::time::Duration;

/// Answers "has the artifact appeared yet?".
pub trait ArtifactProbe {
    fn exists(&self, path: &Path) -> bool;
}

pub struct FsProbe;

impl ArtifactProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
