//! Sesiones del analista de sentimiento: una transcripción por sesión que crece
//! con cada frase enviada y su respuesta.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{ChatMessage, Role},
    sentiment::{Prediction, SentimentError, SharedClassifier},
};

/// Transcripción de una sesión.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub last_seen: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            messages: Vec::new(),
            last_seen: Utc::now(),
        }
    }
}

/// Frase de respuesta para una predicción.
pub fn render_prediction(prediction: &Prediction) -> String {
    format!(
        "El sentimiento de la frase es {} con una confianza del {:.2}%.",
        prediction.label.sentimiento(),
        prediction.score * 100.0
    )
}

/// Almacén en memoria de sesiones; se pierde al reiniciar el servidor.
///
/// Sólo [`SessionStore::create`] abre sesiones. Las que pasan más de
/// `idle_timeout` sin actividad se descartan en el siguiente acceso al almacén.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, ChatSession>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(30))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Bloquea el almacén descartando antes las sesiones caducadas.
    fn lock_swept(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ChatSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        let expired = sweep(&mut sessions, Utc::now(), self.idle_timeout);
        if expired > 0 {
            info!("{expired} sesiones de chat caducadas por inactividad");
        }
        sessions
    }

    /// Descarta las sesiones inactivas desde antes de `now - idle_timeout`.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        sweep(&mut self.sessions.lock().unwrap(), now, self.idle_timeout)
    }

    pub fn create(&self) -> ChatSession {
        let session = ChatSession::new(Uuid::new_v4());
        self.lock_swept().insert(session.id, session.clone());
        info!("Sesión de chat creada: {}", session.id);
        session
    }

    /// Aplica `f` a la sesión, marcándola como activa. `None` si no existe.
    fn touch<T>(&self, id: Uuid, f: impl FnOnce(&mut ChatSession) -> T) -> Option<T> {
        let mut sessions = self.lock_swept();
        let session = sessions.get_mut(&id)?;
        session.last_seen = Utc::now();
        Some(f(session))
    }

    pub fn get(&self, id: Uuid) -> Option<ChatSession> {
        self.touch(id, |session| session.clone())
    }

    fn push(&self, id: Uuid, message: ChatMessage) -> Option<ChatSession> {
        self.touch(id, |session| {
            session.messages.push(message);
            session.clone()
        })
    }

    /// Vacía la transcripción sin cerrar la sesión.
    pub fn reset(&self, id: Uuid) -> Option<ChatSession> {
        self.touch(id, |session| {
            session.messages.clear();
            session.clone()
        })
    }

    /// Fin de sesión: descarta la transcripción. Devuelve si existía.
    pub fn end(&self, id: Uuid) -> bool {
        self.lock_swept().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_swept().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Añade la frase del usuario, la clasifica y añade la respuesta.
    /// Un error del clasificador se muestra como respuesta, sin reintentos.
    /// `None` si la sesión no existe o terminó durante la clasificación.
    pub async fn submit(
        &self,
        id: Uuid,
        phrase: &str,
        classifier: &SharedClassifier,
    ) -> Option<ChatSession> {
        self.push(id, ChatMessage::new(Role::User, phrase))?;

        // El lock no se mantiene durante la llamada al modelo.
        let reply = match classifier.classify(phrase, false).await {
            Ok(prediction) => render_prediction(&prediction),
            Err(err) => {
                if matches!(err, SentimentError::Model(_)) {
                    warn!("Fallo del modelo en la sesión {id}: {err}");
                }
                err.to_string()
            }
        };

        self.push(id, ChatMessage::new(Role::Assistant, reply))
    }
}

fn sweep(sessions: &mut HashMap<Uuid, ChatSession>, now: DateTime<Utc>, idle: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| now - session.last_seen <= idle);
    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::sentiment::{Polarity, SentimentClassifier};

    fn classifier() -> SharedClassifier {
        let cfg = AppConfig::local("./data");
        SharedClassifier::preloaded(&cfg, SentimentClassifier::lexicon())
    }

    #[test]
    fn renders_label_and_percentage() {
        let text = render_prediction(&Prediction::new(Polarity::Positive, 0.9876));
        assert_eq!(
            text,
            "El sentimiento de la frase es Positivo con una confianza del 98.76%."
        );
    }

    #[tokio::test]
    async fn transcript_grows_with_each_turn() {
        let store = SessionStore::new();
        let session = store.create();
        let classifier = classifier();

        store.submit(session.id, "Great food and service!", &classifier).await.unwrap();
        let after = store
            .submit(session.id, "Rude staff, awful soup", &classifier)
            .await
            .unwrap();

        let roles: Vec<Role> = after.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert!(after.messages[1].content.contains("Positivo"));
        assert!(after.messages[3].content.contains("Negativo"));
    }

    #[tokio::test]
    async fn classifier_errors_are_shown_in_place_of_a_result() {
        let store = SessionStore::new();
        let id = store.create().id;
        let long = "x".repeat(600);

        let session = store.submit(id, &long, &classifier()).await.unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert!(session.messages[1].content.contains("max characters is 512"));
    }

    #[tokio::test]
    async fn reset_clears_and_end_discards() {
        let store = SessionStore::new();
        let id = store.create().id;
        store.submit(id, "nice", &classifier()).await.unwrap();

        assert!(store.reset(id).unwrap().messages.is_empty());
        assert_eq!(store.len(), 1);

        assert!(store.end(id));
        assert!(!store.end(id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_never_create_sessions() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        assert!(store.get(id).is_none());
        assert!(store.reset(id).is_none());
        assert!(store.submit(id, "hola", &classifier()).await.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create().id;
        let b = store.create().id;
        store.push(a, ChatMessage::new(Role::User, "hola")).unwrap();
        assert_eq!(store.get(a).unwrap().messages.len(), 1);
        assert!(store.get(b).unwrap().messages.is_empty());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::with_idle_timeout(Duration::minutes(30));
        let id = store.create().id;

        assert_eq!(store.sweep_expired_at(Utc::now() + Duration::minutes(10)), 0);
        assert!(store.get(id).is_some());

        assert_eq!(store.sweep_expired_at(Utc::now() + Duration::minutes(31)), 1);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn any_access_sweeps_stale_sessions() {
        let store = SessionStore::with_idle_timeout(Duration::minutes(30));
        let stale = store.create().id;
        let fresh = store.create().id;
        store.sessions.lock().unwrap().get_mut(&stale).unwrap().last_seen =
            Utc::now() - Duration::hours(2);

        assert!(store.get(fresh).is_some());
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
        assert!(store.get(stale).is_none());
    }

    #[test]
    fn activity_refreshes_last_seen() {
        let store = SessionStore::new();
        let id = store.create().id;
        let old = Utc::now() - Duration::minutes(20);
        store.sessions.lock().unwrap().get_mut(&id).unwrap().last_seen = old;

        let session = store.get(id).unwrap();
        assert!(session.last_seen > old);
    }
}
