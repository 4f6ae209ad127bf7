//! Finance API client methods

use super::{ApiClient, ClientError};
use crate::types::{
    Budget, BudgetCreate, Expense, ExpenseCreate, IncomeSource, IncomeSourceCreate, SavingsGoal,
    SavingsGoalCreate,
};

impl ApiClient {
    /// List income sources
    pub async fn income_sources(&self) -> Result<Vec<IncomeSource>, ClientError> {
        self.get("/finance/income-sources").await
    }

    /// Add an income source
    pub async fn create_income_source(
        &self,
        request: &IncomeSourceCreate,
    ) -> Result<IncomeSource, ClientError> {
        self.post("/finance/income-sources", request).await
    }

    /// List expenses
    pub async fn expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.get("/finance/expenses").await
    }

    /// Record an expense
    pub async fn create_expense(&self, request: &ExpenseCreate) -> Result<Expense, ClientError> {
        self.post("/finance/expenses", request).await
    }

    /// List budgets
    pub async fn budgets(&self) -> Result<Vec<Budget>, ClientError> {
        self.get("/finance/budgets").await
    }

    /// Create a budget
    pub async fn create_budget(&self, request: &BudgetCreate) -> Result<Budget, ClientError> {
        self.post("/finance/budgets", request).await
    }

    /// List savings goals
    pub async fn savings_goals(&self) -> Result<Vec<SavingsGoal>, ClientError> {
        self.get("/finance/savings-goals").await
    }

    /// Create a savings goal
    pub async fn create_savings_goal(
        &self,
        request: &SavingsGoalCreate,
    ) -> Result<SavingsGoal, ClientError> {
        self.post("/finance/savings-goals", request).await
    }
}
