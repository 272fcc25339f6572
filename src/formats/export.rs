//! Parallel export batch runner.
//!
//! Exporting a fixture batch is embarrassingly parallel: fixtures share
//! no mutable state. The runner fans the batch out over rayon workers;
//! files and failures accumulate append-only behind mutexes and are
//! sorted afterwards so output is deterministic regardless of worker
//! scheduling.

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::warn;

use crate::model::{Fixture, Manufacturer};

use super::{ExportFailure, ExportResult, ExportedFile};

/// Run `per_fixture` for every fixture in parallel and collect the
/// outcome. One fixture's failure never aborts the others.
pub fn export_each<F>(fixtures: &[(Manufacturer, Fixture)], per_fixture: F) -> ExportResult
where
    F: Fn(&Manufacturer, &Fixture) -> Result<Vec<ExportedFile>, ExportFailure> + Sync,
{
    let files: Mutex<Vec<ExportedFile>> = Mutex::new(Vec::new());
    let failures: Mutex<Vec<ExportFailure>> = Mutex::new(Vec::new());

    fixtures
        .par_iter()
        .for_each(|(manufacturer, fixture)| match per_fixture(manufacturer, fixture) {
            Ok(mut exported) => files.lock().append(&mut exported),
            Err(failure) => {
                warn!(fixture = %failure.fixture, error = %failure.source, "fixture export failed");
                failures.lock().push(failure);
            }
        });

    let mut files = files.into_inner();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    let mut failures = failures.into_inner();
    failures.sort_by(|a, b| a.fixture.cmp(&b.fixture));

    ExportResult { files, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatError;

    fn fixture(name: &str) -> (Manufacturer, Fixture) {
        (
            Manufacturer::new("acme", "Acme"),
            Fixture::new(name.to_string()),
        )
    }

    #[test]
    fn test_one_failure_does_not_abort_batch() {
        let batch = vec![fixture("Good A"), fixture("Broken"), fixture("Good B")];

        let result = export_each(&batch, |manufacturer, fixture| {
            if fixture.name == "Broken" {
                return Err(ExportFailure {
                    fixture: fixture.name.clone(),
                    mode: None,
                    source: FormatError::parse("boom"),
                });
            }
            Ok(vec![ExportedFile {
                name: format!("{}-{}.txt", manufacturer.key, fixture.key()),
                content: Vec::new(),
                mime_type: "text/plain",
                related_fixtures: vec![fixture.key()],
            }])
        });

        assert_eq!(result.files.len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].fixture, "Broken");
    }

    #[test]
    fn test_output_is_sorted() {
        let batch = vec![fixture("Zeta"), fixture("Alpha")];
        let result = export_each(&batch, |manufacturer, fixture| {
            Ok(vec![ExportedFile {
                name: format!("{}-{}.txt", manufacturer.key, fixture.key()),
                content: Vec::new(),
                mime_type: "text/plain",
                related_fixtures: vec![fixture.key()],
            }])
        });
        assert_eq!(result.files[0].name, "acme-alpha.txt");
        assert_eq!(result.files[1].name, "acme-zeta.txt");
    }
}
