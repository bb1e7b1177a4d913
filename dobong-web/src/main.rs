//! Servidor web Axum do chatbot de Dobong: UI de chat, rotas de
//! recomendação e health-check, com sanitização de NaN/Infinity no JSON.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use dobong_core::{parse_user_text, suggest_alternatives, Place, PlaceDataset, Recommender};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Estado compartilhado da aplicação.
struct AppState {
    recommender: Recommender,
}

/// Corpo de `POST /api/dobong/recommend`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RecommendRequest {
    category: Option<String>,
    keyword: Option<String>,
    k: Option<i64>,
    /// Qualquer escalar JSON; coagido para string antes de virar seed.
    seed: Option<Value>,
    offset: Option<i64>,
    user_location: Option<Value>,
}

/// Corpo de `POST /api/chatbot`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ChatbotRequest {
    text: Option<String>,
    category: Option<String>,
    keyword: Option<String>,
    k: Option<i64>,
    seed: Option<Value>,
    offset: Option<i64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let data_dir = std::env::var("DOBONG_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));
    let dataset = PlaceDataset::load(&data_dir);
    if !dataset.is_loaded() {
        // Fontes ausentes degradam para "sem recomendações", nunca derrubam
        warn!("nenhuma fonte de dados encontrada em {}", data_dir.display());
    }

    let recommender = Recommender::new(dataset);
    let status = recommender.health_status();
    info!(
        "dados carregados: 느좋={} 핫플={} (low: {}/{})",
        status.neujoh_count_all, status.hotple_count_all,
        status.neujoh_count_low, status.hotple_count_low,
    );

    let state = Arc::new(AppState { recommender });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(chat_ui_handler))
        .route("/chat", get(chat_ui_handler))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/api/health", get(health_handler))
        .route("/api/dobong/recommend", post(recommend_handler))
        .route("/api/chatbot", post(chatbot_handler))
        .layer(cors)
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("bind do listener");
    info!("🚀 Dobong Chatbot em http://localhost:{port}");
    axum::serve(listener, app).await.expect("servidor axum");
}

/// Página principal do chat.
async fn chat_ui_handler() -> impl IntoResponse {
    Html(include_str!("templates/chat.html"))
}

/// `GET /api/health` — contagens do snapshot e flag de carga.
async fn health_handler(state: axum::extract::State<Arc<AppState>>) -> Response {
    let status = state.recommender.health_status();
    match serde_json::to_value(&status) {
        Ok(data) => json_response(StatusCode::OK, json!({ "ok": true, "data": data })),
        Err(err) => internal_error(&err.to_string()),
    }
}

/// `POST /api/dobong/recommend` — recomendação estruturada.
///
/// Corpo malformado degrada para o pedido padrão (k=5, offset=0), nunca
/// responde 400.
async fn recommend_handler(
    state: axum::extract::State<Arc<AppState>>,
    body: Option<Json<RecommendRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let k = req.k.unwrap_or(5);
    let offset = req.offset.unwrap_or(0);
    let seed = req.seed.as_ref().and_then(seed_to_string);
    let user_location = req.user_location.as_ref().and_then(parse_user_location);

    let results = state.recommender.recommend(
        req.category.as_deref(),
        req.keyword.as_deref(),
        user_location,
        k,
        seed.as_deref(),
        offset,
    );

    let count = results.len();
    let explain = format!("k={k}, offset={offset} 적용. 20% 우선 → 50% → 전체 순으로 추천.");

    let results_value = match serde_json::to_value(&results) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.to_string()),
    };

    let mut payload = json!({
        "status": "success",
        "count": count,
        "results": results_value,
        "explain": explain,
    });
    // Poucos resultados na primeira página: sugere reformular a busca
    if (count as i64) < (k / 2).max(1) && offset == 0 {
        if let Ok(reask) = serde_json::to_value(suggest_alternatives(
            req.category.as_deref(),
            req.keyword.as_deref(),
        )) {
            payload["reask"] = reask;
        }
    }

    json_response(StatusCode::OK, payload)
}

/// `POST /api/chatbot` — texto livre do chat.
///
/// Interpreta o texto, deduz a categoria padrão da conversa e compõe a
/// mensagem "Top N-M" com os resultados numerados.
async fn chatbot_handler(
    state: axum::extract::State<Arc<AppState>>,
    body: Option<Json<ChatbotRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let user_text = req.text.unwrap_or_default();
    let k = req.k.unwrap_or(5);
    let offset = req.offset.unwrap_or(0);
    let seed = req.seed.as_ref().and_then(seed_to_string);

    let parsed = parse_user_text(&user_text);
    let mut category = parsed.category.clone().or(req.category);
    let keyword = parsed.keyword.clone().or(req.keyword);

    // Dedução da categoria padrão da conversa
    if !matches!(category.as_deref(), Some("느좋") | Some("숨은핫플")) {
        let is_hot = keyword
            .as_deref()
            .map(|kw| ["친구", "연인", "핫플", "카페", "맛집"].iter().any(|h| kw.contains(h)))
            .unwrap_or(false);
        category = Some(if is_hot { "숨은핫플" } else { "느좋" }.to_string());
    }

    let results = state.recommender.recommend(
        category.as_deref(),
        keyword.as_deref(),
        parsed.user_location,
        k,
        seed.as_deref(),
        offset,
    );

    let message = compose_summary(category.as_deref(), keyword.as_deref(), &results, k, offset);

    let results_value = match serde_json::to_value(&results) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.to_string()),
    };
    let parsed_value = serde_json::to_value(&parsed).unwrap_or(Value::Null);

    json_response(
        StatusCode::OK,
        json!({
            "status": "success",
            "parsed": parsed_value,
            "k": k,
            "offset": offset,
            "results": results_value,
            "message": message,
        }),
    )
}

/// Compõe a mensagem de resumo do chat ("Top 1-5" etc.).
fn compose_summary(
    category: Option<&str>,
    keyword: Option<&str>,
    results: &[Place],
    k: i64,
    offset: i64,
) -> String {
    if results.is_empty() {
        if offset > 0 {
            return "더 이상 추천할 장소가 없습니다. 다른 키워드를 입력해보세요.".to_string();
        }
        let alt = suggest_alternatives(category, keyword);
        return format!(
            "해당 조건에서는 추천이 적습니다. 대신 이런 키워드는 어때요? {}",
            alt.alt_keywords.join(", ")
        );
    }

    let category_text = if category == Some("숨은핫플") { "숨은핫플" } else { "느좋" };
    let keyword_text = keyword.unwrap_or("없음");
    let range_text = if offset == 0 {
        "Top 1-5".to_string()
    } else {
        format!("Top {}-{}", offset + 1, offset + k)
    };

    let mut lines = vec![format!("요청: {category_text} / 키워드: {keyword_text} ({range_text})")];
    for (i, place) in results.iter().enumerate() {
        let name = place
            .name
            .as_deref()
            .or(place.id.as_deref())
            .unwrap_or("이름없음");
        lines.push(format!("{}. {name}", i + 1));
    }
    lines.join("\n")
}

/// Coage a seed (qualquer escalar JSON) para string.
fn seed_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Interpreta `{"lat": .., "lon": ..}`; malformado colapsa para `None`.
fn parse_user_location(value: &Value) -> Option<(f64, f64)> {
    let map = value.as_object()?;
    let lat = coerce_f64(map.get("lat")?)?;
    let lon = coerce_f64(map.get("lon")?)?;
    Some((lat, lon))
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Substitui números não finitos por `null`, em qualquer profundidade.
///
/// A pontuação do motor é sempre finita, mas os campos repassados das
/// fontes podem trazer qualquer coisa — nenhum NaN/Infinity atravessa a
/// fronteira.
fn sanitize_json(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter().map(|(key, v)| (key, sanitize_json(v))).collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::Null,
            _ => Value::Number(n),
        },
        other => other,
    }
}

fn json_response(status: StatusCode, payload: Value) -> Response {
    (status, Json(sanitize_json(payload))).into_response()
}

/// Falha interna genérica: sempre JSON, nunca HTML de erro.
fn internal_error(detail: &str) -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "status": "error", "message": "서버 내부 오류", "detail": detail }),
    )
}
