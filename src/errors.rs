use std::fmt;

#[derive(Debug, Clone)]
pub enum VaultlinkError {
    Unauthorized(String),
    Validation(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    DuplicateCode(String),
    FileOperation(String),
    Serialization(String),
    NotFound(String),
    Forward(String),
    Notify(String),
}

impl VaultlinkError {
    pub fn code(&self) -> &'static str {
        match self {
            VaultlinkError::Unauthorized(_) => "E001",
            VaultlinkError::Validation(_) => "E002",
            VaultlinkError::DatabaseConfig(_) => "E003",
            VaultlinkError::DatabaseConnection(_) => "E004",
            VaultlinkError::DatabaseOperation(_) => "E005",
            VaultlinkError::DuplicateCode(_) => "E006",
            VaultlinkError::FileOperation(_) => "E007",
            VaultlinkError::Serialization(_) => "E008",
            VaultlinkError::NotFound(_) => "E009",
            VaultlinkError::Forward(_) => "E010",
            VaultlinkError::Notify(_) => "E011",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            VaultlinkError::Unauthorized(_) => "Unauthorized",
            VaultlinkError::Validation(_) => "Validation Error",
            VaultlinkError::DatabaseConfig(_) => "Database Configuration Error",
            VaultlinkError::DatabaseConnection(_) => "Database Connection Error",
            VaultlinkError::DatabaseOperation(_) => "Database Operation Error",
            VaultlinkError::DuplicateCode(_) => "Duplicate Short Code",
            VaultlinkError::FileOperation(_) => "File Operation Error",
            VaultlinkError::Serialization(_) => "Serialization Error",
            VaultlinkError::NotFound(_) => "Resource Not Found",
            VaultlinkError::Forward(_) => "Upstream Forward Error",
            VaultlinkError::Notify(_) => "Upstream Notify Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            VaultlinkError::Unauthorized(msg)
            | VaultlinkError::Validation(msg)
            | VaultlinkError::DatabaseConfig(msg)
            | VaultlinkError::DatabaseConnection(msg)
            | VaultlinkError::DatabaseOperation(msg)
            | VaultlinkError::DuplicateCode(msg)
            | VaultlinkError::FileOperation(msg)
            | VaultlinkError::Serialization(msg)
            | VaultlinkError::NotFound(msg)
            | VaultlinkError::Forward(msg)
            | VaultlinkError::Notify(msg) => msg,
        }
    }
}

impl fmt::Display for VaultlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for VaultlinkError {}

impl VaultlinkError {
    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::Unauthorized(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::Validation(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::DatabaseOperation(msg.into())
    }

    pub fn duplicate_code<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::DuplicateCode(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::Serialization(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::NotFound(msg.into())
    }

    pub fn forward<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::Forward(msg.into())
    }

    pub fn notify<T: Into<String>>(msg: T) -> Self {
        VaultlinkError::Notify(msg.into())
    }
}

impl From<sea_orm::DbErr> for VaultlinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        // Unique-key violations get their own variant so that code minting
        // can retry instead of reporting a generic store failure.
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            VaultlinkError::DuplicateCode(err.to_string())
        } else {
            VaultlinkError::DatabaseOperation(err.to_string())
        }
    }
}

impl From<std::io::Error> for VaultlinkError {
    fn from(err: std::io::Error) -> Self {
        VaultlinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for VaultlinkError {
    fn from(err: serde_json::Error) -> Self {
        VaultlinkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultlinkError>;
