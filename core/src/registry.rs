use std::{
    collections::HashMap,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::program::{DirKey, Program};

/// In-memory map from directory to the program currently tracked for it.
///
/// The lock is only ever held for the duration of a single call, never across an
/// `.await`, so callers always see a consistent snapshot of one entry.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: Mutex<HashMap<DirKey, Program>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DirKey, Program>> {
        self.programs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, dir: &Path) -> Option<Program> {
        self.lock().get(dir).cloned()
    }

    /// Returns the program previously registered for the same directory.
    pub fn insert(&self, program: Program) -> Option<Program> {
        self.lock().insert(program.dir.clone(), program)
    }

    pub fn remove(&self, dir: &Path) -> Option<Program> {
        self.lock().remove(dir)
    }

    /// Mutate the program for `dir` in place. `None` if nothing is registered.
    pub fn update<R>(&self, dir: &Path, f: impl FnOnce(&mut Program) -> R) -> Option<R> {
        self.lock().get_mut(dir).map(f)
    }

    /// A program is registered for `dir` and a poll loop is active for it.
    pub fn is_being_tested(&self, dir: &Path) -> bool {
        self.lock()
            .get(dir)
            .map_or(false, Program::is_being_tested)
    }

    pub fn keys(&self) -> Vec<DirKey> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::RunResult;
    use autotest_webclient::{ProgramId, TaskId};

    #[test]
    fn one_program_per_directory() {
        let reg = ProgramRegistry::new();
        assert!(reg.insert(Program::new("/w/a", TaskId(1), ProgramId(10))).is_none());
        let prev = reg.insert(Program::new("/w/a", TaskId(2), ProgramId(11)));
        assert_eq!(prev.unwrap().id, Some(ProgramId(10)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(Path::new("/w/a")).unwrap().id, Some(ProgramId(11)));
    }

    #[test]
    fn being_tested_follows_result() {
        let reg = ProgramRegistry::new();
        let dir = Path::new("/w/a");
        assert!(!reg.is_being_tested(dir));

        reg.insert(Program::new(dir, TaskId(1), ProgramId(10)));
        assert!(!reg.is_being_tested(dir));

        reg.update(dir, |p| p.result = Some(RunResult::waiting()));
        assert!(reg.is_being_tested(dir));

        reg.update(dir, |p| p.result = None);
        assert!(!reg.is_being_tested(dir));
    }

    #[test]
    fn update_and_remove_missing() {
        let reg = ProgramRegistry::new();
        assert_eq!(reg.update(Path::new("/nope"), |p| p.total_tests), None);
        assert!(reg.remove(Path::new("/nope")).is_none());
        assert!(reg.is_empty());
    }
}
