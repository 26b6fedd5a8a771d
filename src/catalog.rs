//! Notebooks exercised by `nbtest test`.
//!
//! Paths are relative to the notebook root. A case with a skip reason is
//! reported as skipped and never converted or run.

use std::path::{Path, PathBuf};

/// One notebook test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookCase {
    pub name: &'static str,
    pub path: &'static str,
    pub skip: Option<&'static str>,
}

impl NotebookCase {
    const fn run(name: &'static str, path: &'static str) -> Self {
        Self { name, path, skip: None }
    }

    const fn skip(name: &'static str, path: &'static str, reason: &'static str) -> Self {
        Self {
            name,
            path,
            skip: Some(reason),
        }
    }

    /// Notebook location under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.path)
    }
}

pub const NOTEBOOKS: &[NotebookCase] = &[
    NotebookCase::run("test_linq_basics_notebook", "workflow_basics/1.the_basics.ipynb"),
    NotebookCase::run("test_linq_noisy_simulation_notebook", "workflow_basics/3.noisy_simulation.ipynb"),
    NotebookCase::skip(
        "test_dmet_notebook",
        "problem_decomposition/dmet.ipynb",
        "Takes too long for get_resources",
    ),
    NotebookCase::run("test_vqe_notebook", "variational_methods/vqe.ipynb"),
    NotebookCase::run("test_adapt_notebook", "variational_methods/adapt.ipynb"),
    NotebookCase::run(
        "test_vqe_custom_ansatz_notebook",
        "variational_methods/vqe_custom_ansatz_hamiltonian.ipynb",
    ),
    NotebookCase::run("test_oniom_notebook", "problem_decomposition/oniom.ipynb"),
    NotebookCase::run("test_excited_states", "chemistry/excited_states.ipynb"),
    NotebookCase::skip(
        "test_qemist_cloud_hardware_experiments_notebook",
        "hardware_experiments/qemist_cloud_hardware_experiments_braket.ipynb",
        "Requires qemist cloud access",
    ),
    NotebookCase::run(
        "test_classical_shadows_notebook",
        "measurement_reduction/classical_shadows.ipynb",
    ),
    NotebookCase::run("test_mifno_notebook", "problem_decomposition/mifno.ipynb"),
    NotebookCase::run("test_iQCC_clifford_notebook", "variational_methods/iqcc_using_clifford.ipynb"),
    NotebookCase::skip(
        "test_overview_end_to_end_notebook",
        "hardware_experiments/overview_endtoend.ipynb",
        "Takes too long with get_resources",
    ),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = NOTEBOOKS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), NOTEBOOKS.len());
    }

    #[test]
    fn test_catalog_skips() {
        let skipped: Vec<_> = NOTEBOOKS.iter().filter(|c| c.skip.is_some()).map(|c| c.name).collect();
        assert_eq!(
            skipped,
            vec![
                "test_dmet_notebook",
                "test_qemist_cloud_hardware_experiments_notebook",
                "test_overview_end_to_end_notebook",
            ]
        );
    }

    #[test]
    fn test_catalog_paths_are_relative_notebooks() {
        for case in NOTEBOOKS {
            assert!(Path::new(case.path).is_relative(), "{}", case.path);
            assert!(case.path.ends_with(".ipynb"), "{}", case.path);
            assert!(case.name.starts_with("test_"), "{}", case.name);
        }
    }

    #[test]
    fn test_resolve_joins_root() {
        let case = NOTEBOOKS[0];
        assert_eq!(
            case.resolve(Path::new("/nb")),
            PathBuf::from("/nb/workflow_basics/1.the_basics.ipynb")
        );
    }
}
