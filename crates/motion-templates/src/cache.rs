//! Template Library (C1): resolves `(test_name, model) -> reference feature
//! matrix`, cached process-wide after first successful load.

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use ndarray::Array2;
use ndarray_npy::NpzReader;

use motion_models::canonical::normalize_test_name;
use motion_models::model::TestModel;

use crate::error::{TemplateError, TemplateResultT};

type Key = (String, TestModel);

/// Process-wide, read-mostly template cache. Cache misses are guarded by a
/// per-key initialization lock so concurrent loads of *different* templates
/// never block each other, while concurrent loads of the *same* template
/// collapse onto a single disk read.
pub struct TemplateLibrary {
    root: PathBuf,
    cache: RwLock<HashMap<Key, Arc<Array2<f32>>>>,
    init_locks: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
}

impl TemplateLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
            init_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a reference feature matrix. Blocking: callers on an async
    /// reactor should run this via `spawn_blocking` (the cache-miss path
    /// is a disk read, per §5's suspension-point list).
    pub fn load(&self, test_name: &str, model: TestModel) -> TemplateResultT<Arc<Array2<f32>>> {
        let canonical = normalize_test_name(test_name);
        let key: Key = (canonical, model);

        if let Some(hit) = self.cache.read().expect("cache lock poisoned").get(&key) {
            return Ok(hit.clone());
        }

        let lock = {
            let mut locks = self.init_locks.lock().expect("init lock map poisoned");
            locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        let _guard = lock.lock().expect("per-key init lock poisoned");

        // Another thread may have populated the cache while we waited.
        if let Some(hit) = self.cache.read().expect("cache lock poisoned").get(&key) {
            return Ok(hit.clone());
        }

        let matrix = Arc::new(self.read_from_disk(&key.0, model)?);
        self.cache
            .write()
            .expect("cache lock poisoned")
            .insert(key, matrix.clone());
        Ok(matrix)
    }

    fn read_from_disk(&self, canonical_test: &str, model: TestModel) -> TemplateResultT<Array2<f32>> {
        let missing = || TemplateError::TemplateMissing {
            test_name: canonical_test.to_string(),
            model: model.as_str().to_string(),
        };
        let malformed = |reason: String| TemplateError::TemplateMalformed {
            test_name: canonical_test.to_string(),
            model: model.as_str().to_string(),
            reason,
        };

        let path = self.root.join(canonical_test).join(format!("{}.npz", model.as_str()));
        let file = File::open(&path).map_err(|_| missing())?;
        let mut npz = NpzReader::new(file).map_err(|e| malformed(e.to_string()))?;
        let array: Array2<f32> = npz
            .by_name("X.npy")
            .map_err(|e| malformed(format!("missing or unreadable array 'X': {e}")))?;

        validate(&array, model).map_err(malformed)?;
        Ok(array)
    }
}

fn validate(array: &Array2<f32>, model: TestModel) -> Result<(), String> {
    let (t, d) = array.dim();
    if t < 2 {
        return Err(format!("template has {t} frames, need at least 2"));
    }
    if !model.allowed_dims().contains(&d) {
        return Err(format!(
            "template has dimensionality {d}, expected one of {:?} for model '{}'",
            model.allowed_dims(),
            model.as_str()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::NpzWriter;
    use tempfile::tempdir;

    fn write_fixture(root: &std::path::Path, test_name: &str, model: TestModel, array: &Array2<f32>) {
        let dir = root.join(test_name);
        std::fs::create_dir_all(&dir).unwrap();
        let file = File::create(dir.join(format!("{}.npz", model.as_str()))).unwrap();
        let mut npz = NpzWriter::new(file);
        npz.add_array("X", array).unwrap();
        npz.finish().unwrap();
    }

    #[test]
    fn loads_valid_template_and_caches_it() {
        let dir = tempdir().unwrap();
        let x: Array2<f32> = Array2::zeros((10, 42));
        write_fixture(dir.path(), "stand-and-sit", TestModel::Hands, &x);

        let lib = TemplateLibrary::new(dir.path());
        let a = lib.load("stand-and-sit", TestModel::Hands).unwrap();
        let b = lib.load("stand-and-sit", TestModel::Hands).unwrap();
        assert_eq!(a.dim(), (10, 42));
        assert!(Arc::ptr_eq(&a, &b), "second load should hit the cache");
    }

    #[test]
    fn resolves_via_canonical_alias() {
        let dir = tempdir().unwrap();
        let x: Array2<f32> = Array2::zeros((5, 42));
        write_fixture(dir.path(), "finger-tapping", TestModel::Hands, &x);

        let lib = TemplateLibrary::new(dir.path());
        let result = lib.load("finger-taping", TestModel::Hands);
        assert!(result.is_ok());
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = tempdir().unwrap();
        let lib = TemplateLibrary::new(dir.path());
        let err = lib.load("stand-and-sit", TestModel::Pose).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateMissing { .. }));
    }

    #[test]
    fn too_short_template_is_malformed() {
        let dir = tempdir().unwrap();
        let x: Array2<f32> = array![[0.0; 42]];
        write_fixture(dir.path(), "stand-and-sit", TestModel::Hands, &x);

        let lib = TemplateLibrary::new(dir.path());
        let err = lib.load("stand-and-sit", TestModel::Hands).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateMalformed { .. }));
    }

    #[test]
    fn wrong_dimensionality_is_malformed() {
        let dir = tempdir().unwrap();
        let x: Array2<f32> = Array2::zeros((10, 10));
        write_fixture(dir.path(), "stand-and-sit", TestModel::Hands, &x);

        let lib = TemplateLibrary::new(dir.path());
        let err = lib.load("stand-and-sit", TestModel::Hands).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateMalformed { .. }));
    }

    #[test]
    fn pose_accepts_both_2d_and_3d_widths() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "fist-open-close", TestModel::Pose, &Array2::zeros((8, 66)));
        write_fixture(dir.path(), "stand-and-sit", TestModel::Pose, &Array2::zeros((8, 99)));

        let lib = TemplateLibrary::new(dir.path());
        assert!(lib.load("fist-open-close", TestModel::Pose).is_ok());
        assert!(lib.load("stand-and-sit", TestModel::Pose).is_ok());
    }
}
