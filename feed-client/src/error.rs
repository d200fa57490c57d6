use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Сетевая ошибка шлюза `feed-client`.
///
/// Единственный вид ошибок шлюза: любой сбой транспорта или ответ сервера
/// со статусом вне диапазона 2xx.
pub enum NetworkError {
    /// Запрос не дошёл до сервера или соединение оборвалось.
    #[error("transport error: {0}")]
    Transport(String),

    /// Сервер ответил статусом вне диапазона 2xx.
    #[error("http status {status}: {message}")]
    Status {
        /// Код HTTP-статуса.
        status: u16,
        /// Тело ответа или описание статуса.
        message: String,
    },

    /// Тело успешного ответа не удалось разобрать.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Результат операций шлюза.
pub type GatewayResult<T> = Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("http status {status}"));
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport(err.to_string())
    }
}
