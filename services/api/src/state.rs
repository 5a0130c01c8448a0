//! Application state shared across handlers

use auth::{
    AuthorizationGuard, CredentialService, UserDirectory,
    jwt::JwtService,
    repositories::{IdentityStore, MemoryUserRepository, UserRepository},
    routes::AuthState,
};
use axum::extract::FromRef;
use sqlx::PgPool;
use std::{path::PathBuf, sync::Arc};

use crate::{
    ledgers::{PaymentLedger, RecyclingLedger, ReportLedger},
    lifecycle::CollectionEngine,
    notify::Notifier,
    reporting::{FsReportArchive, MemoryReportArchive, ReportArchive},
    repositories::{
        CollectionRepository, CollectionStore, MemoryCollectionRepository,
        MemoryPaymentRepository, MemoryReportRepository, MemoryScheduleRepository,
        PaymentRepository, PaymentStore, ReportRepository, ReportStore, ScheduleRepository,
        ScheduleStore,
    },
    schedules::ScheduleService,
};

/// Every store the services read and write
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn IdentityStore>,
    pub collections: Arc<dyn CollectionStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub reports: Arc<dyn ReportStore>,
    pub archive: Arc<dyn ReportArchive>,
}

impl Stores {
    /// Process-local stores
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            collections: Arc::new(MemoryCollectionRepository::new()),
            schedules: Arc::new(MemoryScheduleRepository::new()),
            payments: Arc::new(MemoryPaymentRepository::new()),
            reports: Arc::new(MemoryReportRepository::new()),
            archive: Arc::new(MemoryReportArchive::new()),
        }
    }

    /// PostgreSQL stores, with report files under `report_dir`
    pub fn postgres(pool: PgPool, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            collections: Arc::new(CollectionRepository::new(pool.clone())),
            schedules: Arc::new(ScheduleRepository::new(pool.clone())),
            payments: Arc::new(PaymentRepository::new(pool.clone())),
            reports: Arc::new(ReportRepository::new(pool)),
            archive: Arc::new(FsReportArchive::new(report_dir)),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub directory: UserDirectory,
    pub collections: CollectionEngine,
    pub schedules: ScheduleService,
    pub payments: PaymentLedger,
    pub recycling: RecyclingLedger,
    pub reports: ReportLedger,
}

impl AppState {
    pub fn new(stores: Stores, jwt: JwtService, notifier: Arc<dyn Notifier>) -> Self {
        let credentials = CredentialService::new(stores.users.clone(), jwt);

        Self {
            auth: AuthState::new(credentials.clone()),
            directory: UserDirectory::new(credentials),
            collections: CollectionEngine::new(
                stores.collections.clone(),
                stores.users.clone(),
                notifier.clone(),
            ),
            schedules: ScheduleService::new(stores.schedules, stores.users.clone(), notifier),
            payments: PaymentLedger::new(stores.payments, stores.users.clone()),
            recycling: RecyclingLedger::new(stores.users.clone()),
            reports: ReportLedger::new(
                stores.reports,
                stores.collections,
                stores.users,
                stores.archive,
            ),
        }
    }
}

impl FromRef<AppState> for AuthorizationGuard {
    fn from_ref(state: &AppState) -> Self {
        state.auth.guard.clone()
    }
}
