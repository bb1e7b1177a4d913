//! # dobong-core — Motor de Recomendação de Lugares de Dobong
//!
//! Este crate implementa o núcleo do chatbot de recomendação de pontos de
//! interesse do distrito de Dobong (Seul). Ele mistura dois conjuntos
//! curados de lugares ("느좋", calmos; "핫플", movimentados), um viés por
//! "espaços escondidos" derivado de listas pré-computadas de baixa
//! visibilidade, pesos por palavra-chave e uma perturbação aleatória
//! pequena e reprodutível.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por quatro componentes, do mais básico ao mais alto:
//!
//! 1. **Repositório** ([`repository`]): carrega e normaliza as quatro
//!    fontes (duas listas de lugares, duas listas de identidades de baixa
//!    visibilidade) em um snapshot imutável, construído uma vez no início
//!    do processo. Fonte ausente ou malformada degrada para vazia.
//! 2. **Identidade** ([`place`]): resolve um identificador estável por
//!    prioridade de campos (`id` → `placeId` → `place_id` → `name`), usado
//!    para deduplicar e para pertencimento às listas escondidas.
//! 3. **Pontuação** ([`scoring`]): pontuação composta por lugar (faixa de
//!    visibilidade + viés solicitado + distribuição por palavra-chave +
//!    jitter com seed) e ordenação estável decrescente, sempre sobre
//!    cópias dos registros.
//! 4. **Orquestração** ([`recommend`]): mescla as categorias por
//!    identidade, deduz o viés, invoca a pontuação e aplica a janela de
//!    paginação `[offset, offset + k)`.
//!
//! O módulo [`reask`] complementa com a interpretação do texto livre do
//! chat e as palavras-chave alternativas de fallback.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use dobong_core::{PlaceDataset, Recommender};
//! use serde_json::json;
//!
//! let dataset = PlaceDataset::from_raw(
//!     json!([{ "id": "p1", "name": "서울창포원" }]),
//!     json!([{ "id": "h1", "name": "카페온다" }]),
//!     json!(["p1"]),
//!     json!([]),
//! );
//! let recommender = Recommender::new(dataset);
//!
//! // Top 1-5 para "가족", com jitter reprodutível
//! let places = recommender.recommend(None, Some("가족"), None, 5, Some("seed"), 0);
//! assert_eq!(places[0].name.as_deref(), Some("서울창포원"));
//! ```

pub mod place;
pub mod reask;
pub mod recommend;
pub mod repository;
pub mod scoring;

pub use place::{resolve_identity, BandLabel, Place, CATEGORY_HOTPLE, CATEGORY_NEUJOH};
pub use reask::{parse_user_text, suggest_alternatives, ParsedRequest, Reask};
pub use recommend::{HealthStatus, Recommender};
pub use repository::{DatasetError, PlaceDataset};
pub use scoring::{score_places, KEYWORD_TO_TAG_MAP};
