use sqlx::{
    error::ErrorKind,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::info;

use shared::domain::{
    Appointment, AppointmentId, CollectionPoint, CollectionPointId, UserId, PENDING_MARKER,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to create parent directory '{path}' for database url '{database_url}': {source}")]
    ParentDir {
        path: PathBuf,
        database_url: String,
        source: std::io::Error,
    },
}

impl From<sqlx::Error> for StorageError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &value {
            if matches!(
                db_err.kind(),
                ErrorKind::ForeignKeyViolation
                    | ErrorKind::UniqueViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return Self::Integrity(db_err.message().to_string());
            }
        }
        Self::Database(value)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    Citizen,
    Company,
}

impl UserKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "cidadao",
            Self::Company => "empresa",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCollectionPoint {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStoredAppointment {
    pub user_id: UserId,
    pub collection_point_id: Option<CollectionPointId>,
    pub pickup_date: String,
    pub waste_category: String,
    pub address: Option<String>,
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: u64,
    pub collection_points: u64,
    pub appointments: u64,
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `sqlite::memory:` opens its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_user(&self, name: &str, email: &str, kind: UserKind) -> Result<UserId> {
        let rec = sqlx::query(
            "INSERT INTO usuarios (nome, email, tipo) VALUES (?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET nome = excluded.nome
             RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(UserId(rec.get::<i64, _>(0)))
    }

    pub async fn create_collection_point(
        &self,
        point: &NewCollectionPoint,
    ) -> Result<CollectionPointId> {
        let rec = sqlx::query(
            "INSERT INTO pontos_coleta (nome, endereco, latitude, longitude, horario_func)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&point.name)
        .bind(&point.address)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(&point.opening_hours)
        .fetch_one(&self.pool)
        .await?;
        Ok(CollectionPointId(rec.get::<i64, _>(0)))
    }

    pub async fn list_collection_points(&self) -> Result<Vec<CollectionPoint>> {
        let rows = sqlx::query(
            "SELECT id, nome, endereco, latitude, longitude, horario_func
             FROM pontos_coleta
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CollectionPoint {
                id: CollectionPointId(row.get::<i64, _>("id")),
                nome: row.get("nome"),
                endereco: row.get("endereco"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                horario_func: row.get("horario_func"),
            })
            .collect())
    }

    /// Inserts a new appointment in the initial pending state and returns the
    /// stored record. Resolved user/point names are left empty.
    pub async fn create_appointment(&self, new: &NewStoredAppointment) -> Result<Appointment> {
        let rec = sqlx::query(
            "INSERT INTO agendamentos
                (usuario_id, ponto_coleta_id, data_retirada, tipo_lixo,
                 endereco_coleta, ponto_referencia, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(new.user_id.0)
        .bind(new.collection_point_id.map(|id| id.0))
        .bind(&new.pickup_date)
        .bind(&new.waste_category)
        .bind(&new.address)
        .bind(&new.landmark)
        .bind(PENDING_MARKER)
        .fetch_one(&self.pool)
        .await?;

        let id = AppointmentId(rec.get::<i64, _>(0));
        info!(appointment_id = id.0, user_id = new.user_id.0, "appointment stored");

        Ok(Appointment {
            id,
            status: PENDING_MARKER.to_string(),
            data_retirada: new.pickup_date.clone(),
            tipo_lixo: new.waste_category.clone(),
            endereco_coleta: new.address.clone(),
            ponto_referencia: new.landmark.clone(),
            usuario_id: Some(new.user_id),
            nome_usuario: None,
            email_usuario: None,
            ponto_coleta_id: new.collection_point_id,
            nome_ponto_coleta: None,
        })
    }

    /// All appointments joined with the requesting user and the collection
    /// point, newest pickup date first.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            "SELECT a.id, a.status, a.data_retirada, a.tipo_lixo, a.endereco_coleta,
                    a.ponto_referencia, a.usuario_id, a.ponto_coleta_id,
                    u.nome AS nome_usuario, u.email AS email_usuario,
                    p.nome AS nome_ponto_coleta
             FROM agendamentos a
             JOIN usuarios u ON a.usuario_id = u.id
             LEFT JOIN pontos_coleta p ON a.ponto_coleta_id = p.id
             ORDER BY a.data_retirada DESC, a.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(appointment_from_row).collect())
    }

    /// Returns `false` when no appointment has the given id.
    pub async fn update_appointment_status(&self, id: AppointmentId, status: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE agendamentos SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sample users, collection points and appointments. Safe to run repeatedly:
    /// users are keyed by email, points by name, and appointments are only
    /// seeded into an empty table.
    pub async fn seed_demo_data(&self) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();
        let mut tx = self.pool.begin().await?;

        let users = [
            ("Aline Dev", "aline@exemplo.com", UserKind::Citizen),
            ("Empresa Recicla Tudo", "empresa@recicla.com", UserKind::Company),
        ];
        for (name, email, kind) in users {
            summary.users += sqlx::query(
                "INSERT OR IGNORE INTO usuarios (nome, email, tipo) VALUES (?, ?, ?)",
            )
            .bind(name)
            .bind(email)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        let points = [
            (
                "Ponto Recicla Fácil",
                "Rua das Flores, 100, Centro",
                -23.6698,
                -46.5492,
                "Seg-Sex, 8h-17h",
            ),
            (
                "Ecoponto Central",
                "Av. Queiroz, 500, Vila Assunção",
                -23.6601,
                -46.5350,
                "Sab, 9h-13h",
            ),
        ];
        for (name, address, latitude, longitude, hours) in points {
            summary.collection_points += sqlx::query(
                "INSERT INTO pontos_coleta (nome, endereco, latitude, longitude, horario_func)
                 SELECT ?, ?, ?, ?, ?
                 WHERE NOT EXISTS (SELECT 1 FROM pontos_coleta WHERE nome = ?)",
            )
            .bind(name)
            .bind(address)
            .bind(latitude)
            .bind(longitude)
            .bind(hours)
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agendamentos")
            .fetch_one(&mut *tx)
            .await?;
        if existing == 0 {
            let appointments = [
                ("2025-11-15", "Monitor e CPU"),
                ("2025-11-20", "Celulares e Baterias"),
            ];
            for (date, category) in appointments {
                summary.appointments += sqlx::query(
                    "INSERT INTO agendamentos (usuario_id, data_retirada, tipo_lixo, status)
                     SELECT id, ?, ?, ? FROM usuarios WHERE email = ?",
                )
                .bind(date)
                .bind(category)
                .bind(PENDING_MARKER)
                .bind("aline@exemplo.com")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            }
        }

        tx.commit().await?;
        info!(
            users = summary.users,
            collection_points = summary.collection_points,
            appointments = summary.appointments,
            "demo data seeded"
        );
        Ok(summary)
    }
}

fn appointment_from_row(row: &SqliteRow) -> Appointment {
    Appointment {
        id: AppointmentId(row.get::<i64, _>("id")),
        status: row.get("status"),
        data_retirada: row.get("data_retirada"),
        tipo_lixo: row.get("tipo_lixo"),
        endereco_coleta: row.get("endereco_coleta"),
        ponto_referencia: row.get("ponto_referencia"),
        usuario_id: Some(UserId(row.get::<i64, _>("usuario_id"))),
        nome_usuario: row.get("nome_usuario"),
        email_usuario: row.get("email_usuario"),
        ponto_coleta_id: row
            .get::<Option<i64>, _>("ponto_coleta_id")
            .map(CollectionPointId),
        nome_ponto_coleta: row.get("nome_ponto_coleta"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|source| StorageError::ParentDir {
        path: parent.to_path_buf(),
        database_url: database_url.to_string(),
        source,
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
