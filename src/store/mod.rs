//! Access to the simulation results database.
//!
//! All queries are parameterized and return rows ordered by tick. Row scans
//! hand a forward-only [`RecordStream`] to a closure, so the aggregator can
//! consume the cursor without buffering it first.

mod builder;
mod stream;

pub use builder::Builder;
pub use stream::RecordStream;

use crate::{Error, HouseholdId, PolicyId, RunId, Timestamp, Value};
use rand::{seq::SliceRandom, Rng};
use rusqlite::{params, Connection, OptionalExtension, Params};
use std::path::Path;

/// Column names shared by the queries and the chart builders.
pub mod columns {
    /// Timestamp column (epoch milliseconds)
    pub const TICK: &str = "tick";

    /// Series key column of keyed queries
    pub const KEY: &str = "series_key";

    /// Household demand (averaged in "average" mode)
    pub const DEMAND: &str = "demand";

    /// Number of active appliances (averaged in "average" mode)
    pub const APPLIANCES: &str = "appliancesOn";

    /// Aggregate supply
    pub const SUPPLY: &str = "supply";

    /// Aggregate demand of all households
    pub const OVERALL_DEMAND: &str = "overallDemand";

    /// Price at the tick
    pub const PRICE: &str = "price";
}

pub(crate) const KEY_COLUMN: &str = columns::KEY;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS run (
    run_id INTEGER PRIMARY KEY,
    date INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS household_policy (
    household_policy_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS run_household_log_household_policy (
    run_id INTEGER NOT NULL,
    household_id INTEGER NOT NULL,
    household_policy_id INTEGER NOT NULL,
    PRIMARY KEY (run_id, household_id)
);

CREATE TABLE IF NOT EXISTS household_log (
    run_id INTEGER NOT NULL,
    household_id INTEGER NOT NULL,
    tick INTEGER NOT NULL,
    demand REAL,
    appliancesOn INTEGER,
    PRIMARY KEY (run_id, household_id, tick)
);

CREATE TABLE IF NOT EXISTS aggregator_log (
    run_id INTEGER NOT NULL,
    tick INTEGER NOT NULL,
    supply REAL,
    overallDemand REAL,
    price REAL,
    PRIMARY KEY (run_id, tick)
);
";

/// Metadata of one simulation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunInfo {
    /// Run ID
    pub id: RunId,

    /// When the run was executed (epoch milliseconds)
    pub date: Timestamp,
}

impl RunInfo {
    /// Human-readable label used in chart titles.
    #[must_use]
    pub fn label(&self) -> String {
        crate::time::format_run_date(self.date)
    }
}

/// Handle to the simulation results database.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Creates a builder to configure how the store is opened.
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Opens the database at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the database could not be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Self::builder().open(path)
    }

    /// Creates the tables of the simulation log if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the statements failed.
    pub fn create_schema(&self) -> crate::Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Runs `f` inside one transaction; rolls back if `f` fails.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a storage error if commit failed.
    pub fn batch<T, F>(&self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Self) -> crate::Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let result = f(self)?;
        tx.commit()?;
        Ok(result)
    }

    fn scan<P, T, F>(&self, sql: &str, params: P, f: F) -> crate::Result<T>
    where
        P: Params,
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql)?;

        let names = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        log::trace!("scanning columns {names:?}");

        let rows = stmt.query(params)?;
        f(RecordStream::new(rows, &names))
    }

    /// Returns the metadata of a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRun`] if the run does not exist.
    pub fn run_info(&self, run: RunId) -> crate::Result<RunInfo> {
        let date = self
            .conn
            .query_row("SELECT date FROM run WHERE run_id = ?1", [run], |row| {
                row.get::<_, Timestamp>(0)
            })
            .optional()?
            .ok_or(Error::UnknownRun(run))?;

        Ok(RunInfo { id: run, date })
    }

    /// Lists the policies used by the households of a run, ascending.
    ///
    /// # Errors
    ///
    /// Returns error if the query failed.
    pub fn run_policies(&self, run: RunId) -> crate::Result<Vec<PolicyId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT household_policy_id
             FROM run_household_log_household_policy
             WHERE run_id = ?1
             ORDER BY household_policy_id ASC",
        )?;

        let policies = stmt
            .query_map([run], |row| row.get::<_, PolicyId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        log::debug!("Run {run} uses policies {policies:?}");

        Ok(policies)
    }

    /// Returns `"<name> version <version>"` of a policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPolicy`] if the policy does not exist.
    pub fn policy_info(&self, policy: PolicyId) -> crate::Result<String> {
        self.conn
            .query_row(
                "SELECT name, version FROM household_policy WHERE household_policy_id = ?1",
                [policy],
                |row| {
                    let name: String = row.get(0)?;
                    let version: String = row.get(1)?;
                    Ok(format!("{name} version {version}"))
                },
            )
            .optional()?
            .ok_or(Error::UnknownPolicy(policy))
    }

    /// Lists the households of a run that follow `policy`.
    ///
    /// # Errors
    ///
    /// Returns error if the query failed.
    pub fn policy_households(
        &self,
        run: RunId,
        policy: PolicyId,
    ) -> crate::Result<Vec<HouseholdId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT household_id
             FROM run_household_log_household_policy
             WHERE run_id = ?1 AND household_policy_id = ?2
             ORDER BY household_id ASC",
        )?;

        let households = stmt
            .query_map([run, policy], |row| row.get::<_, HouseholdId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(households)
    }

    /// Picks one household of the run that follows `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHouseholds`] if no household follows the policy.
    pub fn random_household<R: Rng + ?Sized>(
        &self,
        run: RunId,
        policy: PolicyId,
        rng: &mut R,
    ) -> crate::Result<HouseholdId> {
        let household = self
            .policy_households(run, policy)?
            .choose(rng)
            .copied()
            .ok_or(Error::NoHouseholds { run, policy })?;

        log::debug!("Picked household {household} of policy {policy} in run {run}");

        Ok(household)
    }

    /// Scans the average demand and active appliances of every policy of a run.
    ///
    /// Records are keyed by policy ID; policies arrive in ascending order,
    /// each with its ticks ascending.
    ///
    /// # Errors
    ///
    /// Returns error if the query could not be started, or the error of `f`.
    pub fn scan_policy_averages<T, F>(&self, run: RunId, f: F) -> crate::Result<T>
    where
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        self.scan(
            "SELECT h.tick AS tick,
                    p.household_policy_id AS series_key,
                    AVG(h.demand) AS demand,
                    AVG(h.appliancesOn) AS appliancesOn
             FROM household_log h
             JOIN run_household_log_household_policy p
               ON p.run_id = h.run_id AND p.household_id = h.household_id
             WHERE h.run_id = ?1
             GROUP BY p.household_policy_id, h.tick
             ORDER BY p.household_policy_id ASC, h.tick ASC",
            [run],
            f,
        )
    }

    /// Scans the average demand and active appliances of one policy.
    ///
    /// # Errors
    ///
    /// Returns error if the query could not be started, or the error of `f`.
    pub fn scan_policy_average<T, F>(&self, run: RunId, policy: PolicyId, f: F) -> crate::Result<T>
    where
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        self.scan(
            "SELECT h.tick AS tick,
                    AVG(h.demand) AS demand,
                    AVG(h.appliancesOn) AS appliancesOn
             FROM household_log h
             JOIN run_household_log_household_policy p
               ON p.run_id = h.run_id AND p.household_id = h.household_id
             WHERE h.run_id = ?1 AND p.household_policy_id = ?2
             GROUP BY h.tick
             ORDER BY h.tick ASC",
            [run, policy],
            f,
        )
    }

    /// Scans the demand and active appliances of one household.
    ///
    /// # Errors
    ///
    /// Returns error if the query could not be started, or the error of `f`.
    pub fn scan_household<T, F>(&self, run: RunId, household: HouseholdId, f: F) -> crate::Result<T>
    where
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        self.scan(
            "SELECT tick, demand, appliancesOn
             FROM household_log
             WHERE run_id = ?1 AND household_id = ?2
             ORDER BY tick ASC",
            [run, household],
            f,
        )
    }

    /// Scans supply, overall demand and price of a run.
    ///
    /// # Errors
    ///
    /// Returns error if the query could not be started, or the error of `f`.
    pub fn scan_aggregator<T, F>(&self, run: RunId, f: F) -> crate::Result<T>
    where
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        self.scan(
            "SELECT tick, supply, overallDemand, price
             FROM aggregator_log
             WHERE run_id = ?1
             ORDER BY tick ASC",
            [run],
            f,
        )
    }

    /// Scans the price of a run at the ticks the households logged.
    ///
    /// Prices are matched by tick, so a household log and an aggregator log
    /// of different length cannot shift prices onto the wrong time.
    ///
    /// # Errors
    ///
    /// Returns error if the query could not be started, or the error of `f`.
    pub fn scan_prices<T, F>(&self, run: RunId, f: F) -> crate::Result<T>
    where
        F: FnOnce(RecordStream<'_>) -> crate::Result<T>,
    {
        self.scan(
            "SELECT a.tick AS tick, a.price AS price
             FROM aggregator_log a
             WHERE a.run_id = ?1
               AND EXISTS (
                 SELECT 1 FROM household_log h
                 WHERE h.run_id = a.run_id AND h.tick = a.tick
               )
             ORDER BY a.tick ASC",
            [run],
            f,
        )
    }

    /// Registers a run.
    ///
    /// # Errors
    ///
    /// Returns error if the insert failed.
    pub fn insert_run(&self, run: RunId, date: Timestamp) -> crate::Result<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, date) VALUES (?1, ?2)",
            params![run, date],
        )?;
        Ok(())
    }

    /// Registers a household policy.
    ///
    /// # Errors
    ///
    /// Returns error if the insert failed.
    pub fn insert_policy(&self, policy: PolicyId, name: &str, version: &str) -> crate::Result<()> {
        self.conn.execute(
            "INSERT INTO household_policy (household_policy_id, name, version) VALUES (?1, ?2, ?3)",
            params![policy, name, version],
        )?;
        Ok(())
    }

    /// Assigns a household of a run to a policy.
    ///
    /// # Errors
    ///
    /// Returns error if the insert failed.
    pub fn assign_household(
        &self,
        run: RunId,
        household: HouseholdId,
        policy: PolicyId,
    ) -> crate::Result<()> {
        self.conn.execute(
            "INSERT INTO run_household_log_household_policy (run_id, household_id, household_policy_id)
             VALUES (?1, ?2, ?3)",
            params![run, household, policy],
        )?;
        Ok(())
    }

    /// Logs one tick of a household.
    ///
    /// # Errors
    ///
    /// Returns error if the insert failed.
    pub fn log_household(
        &self,
        run: RunId,
        household: HouseholdId,
        tick: Timestamp,
        demand: Value,
        appliances_on: u32,
    ) -> crate::Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO household_log (run_id, household_id, tick, demand, appliancesOn)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![run, household, tick, demand, appliances_on])?;
        Ok(())
    }

    /// Logs one tick of the aggregator.
    ///
    /// # Errors
    ///
    /// Returns error if the insert failed.
    pub fn log_aggregator(
        &self,
        run: RunId,
        tick: Timestamp,
        supply: Value,
        overall_demand: Value,
        price: Value,
    ) -> crate::Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO aggregator_log (run_id, tick, supply, overallDemand, price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![run, tick, supply, overall_demand, price])?;
        Ok(())
    }
}
