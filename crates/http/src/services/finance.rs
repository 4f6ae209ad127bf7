//! Cached finance records for the signed-in user

use super::user_message;
use crate::client::{ApiClient, ClientError};
use crate::types::{
    Budget, BudgetCreate, Expense, ExpenseCreate, IncomeSource, IncomeSourceCreate, SavingsGoal,
    SavingsGoalCreate,
};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Last fetched finance records
#[derive(Debug, Clone, Default)]
pub struct FinanceState {
    pub income_sources: Vec<IncomeSource>,
    pub expenses: Vec<Expense>,
    pub budgets: Vec<Budget>,
    pub savings_goals: Vec<SavingsGoal>,
    /// Message describing the last failed operation
    pub error: Option<String>,
}

/// Finance service
///
/// Keeps the last successful listing of each record type. A failed fetch
/// leaves the previous listing in place and records a message in
/// [`last_error`](Self::last_error). Creating a record refreshes its listing.
pub struct FinanceService {
    client: ApiClient,
    state: Mutex<FinanceState>,
}

impl FinanceService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(FinanceState::default()),
        }
    }

    pub fn income_sources(&self) -> Vec<IncomeSource> {
        self.state().income_sources.clone()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.state().expenses.clone()
    }

    pub fn budgets(&self) -> Vec<Budget> {
        self.state().budgets.clone()
    }

    pub fn savings_goals(&self) -> Vec<SavingsGoal> {
        self.state().savings_goals.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Snapshot of the current state
    pub fn snapshot(&self) -> FinanceState {
        self.state().clone()
    }

    pub async fn fetch_income_sources(&self) -> Result<Vec<IncomeSource>, ClientError> {
        self.fetch(
            self.client.income_sources(),
            "Failed to fetch income sources",
            |state| &mut state.income_sources,
        )
        .await
    }

    pub async fn fetch_expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.fetch(self.client.expenses(), "Failed to fetch expenses", |state| {
            &mut state.expenses
        })
        .await
    }

    pub async fn fetch_budgets(&self) -> Result<Vec<Budget>, ClientError> {
        self.fetch(self.client.budgets(), "Failed to fetch budgets", |state| {
            &mut state.budgets
        })
        .await
    }

    pub async fn fetch_savings_goals(&self) -> Result<Vec<SavingsGoal>, ClientError> {
        self.fetch(
            self.client.savings_goals(),
            "Failed to fetch savings goals",
            |state| &mut state.savings_goals,
        )
        .await
    }

    /// Create an income source, then refresh the listing
    ///
    /// A failed refresh is recorded in [`last_error`](Self::last_error) but the
    /// created record is still returned.
    pub async fn create_income_source(
        &self,
        request: &IncomeSourceCreate,
    ) -> Result<IncomeSource, ClientError> {
        let created = self
            .create(
                self.client.create_income_source(request),
                "Failed to create income source",
            )
            .await?;
        if let Err(e) = self.fetch_income_sources().await {
            warn!(error = %e, "Created income source but failed to refresh the list");
        }
        Ok(created)
    }

    pub async fn create_expense(&self, request: &ExpenseCreate) -> Result<Expense, ClientError> {
        let created = self
            .create(self.client.create_expense(request), "Failed to create expense")
            .await?;
        if let Err(e) = self.fetch_expenses().await {
            warn!(error = %e, "Created expense but failed to refresh the list");
        }
        Ok(created)
    }

    pub async fn create_budget(&self, request: &BudgetCreate) -> Result<Budget, ClientError> {
        let created = self
            .create(self.client.create_budget(request), "Failed to create budget")
            .await?;
        if let Err(e) = self.fetch_budgets().await {
            warn!(error = %e, "Created budget but failed to refresh the list");
        }
        Ok(created)
    }

    pub async fn create_savings_goal(
        &self,
        request: &SavingsGoalCreate,
    ) -> Result<SavingsGoal, ClientError> {
        let created = self
            .create(
                self.client.create_savings_goal(request),
                "Failed to create savings goal",
            )
            .await?;
        if let Err(e) = self.fetch_savings_goals().await {
            warn!(error = %e, "Created savings goal but failed to refresh the list");
        }
        Ok(created)
    }

    async fn fetch<T: Clone>(
        &self,
        request: impl Future<Output = Result<Vec<T>, ClientError>>,
        fallback: &str,
        slot: fn(&mut FinanceState) -> &mut Vec<T>,
    ) -> Result<Vec<T>, ClientError> {
        self.state().error = None;

        match request.await {
            Ok(items) => {
                debug!(count = items.len(), "Fetched finance records");
                *slot(&mut self.state()) = items.clone();
                Ok(items)
            }
            Err(err) => {
                self.state().error = Some(user_message(&err, fallback));
                Err(err)
            }
        }
    }

    async fn create<T>(
        &self,
        request: impl Future<Output = Result<T, ClientError>>,
        fallback: &str,
    ) -> Result<T, ClientError> {
        self.state().error = None;

        request.await.inspect_err(|err| {
            self.state().error = Some(user_message(err, fallback));
        })
    }

    fn state(&self) -> MutexGuard<'_, FinanceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
