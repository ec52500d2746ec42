use crate::reconciler::{GroupedItem, PeriodReconciler, ReconciliationWarning};
use crate::rollup::{rollup, RollupResult};
use crate::schema::{FinancialConfig, PreviousQuantityMap, ProjectInfo, WorkSheet};
use serde::{Deserialize, Serialize};

/// Output of one full pass: reconciliation table plus cover-page rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatement {
    pub project: Option<ProjectInfo>,
    pub items: Vec<GroupedItem>,
    pub rollup: RollupResult,
    pub warnings: Vec<ReconciliationWarning>,
}

impl PaymentStatement {
    /// Runs rows → sheets → reconciliation → rollup from scratch. Nothing is
    /// read from cached subtotals or sheet totals.
    pub fn compute(
        sheets: &[WorkSheet],
        previous_quantities: &PreviousQuantityMap,
        config: &FinancialConfig,
    ) -> Self {
        let reconciliation = PeriodReconciler::new(previous_quantities).reconcile(sheets);
        let rollup = rollup(&reconciliation.items, config);

        Self {
            project: None,
            items: reconciliation.items,
            rollup,
            warnings: reconciliation.warnings,
        }
    }

    pub fn with_project(mut self, project: ProjectInfo) -> Self {
        self.project = Some(project);
        self
    }

    pub fn item(&self, code: &str) -> Option<&GroupedItem> {
        self.items.iter().find(|item| item.code == code)
    }
}
