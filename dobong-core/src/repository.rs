//! # Repositório de Lugares — Carga e Normalização dos Dados
//!
//! Carrega as quatro fontes de dados do distrito de Dobong e as normaliza
//! em um snapshot imutável ([`PlaceDataset`]):
//!
//! - `dobong_neujoh.json` — lista completa da categoria "느좋";
//! - `dobong_hotple.json` — lista completa da categoria "핫플";
//! - `dobong_neujoh_in_low.json` / `dobong_hotple_in_low.json` — listas de
//!   identidades dos 20% menos visíveis de cada categoria.
//!
//! ## Degradação, nunca falha
//!
//! Fonte ausente ou malformada degrada para lista vazia (ou para uma
//! `FeatureCollection` vazia quando a fonte é GeoJSON): o sistema responde
//! "sem recomendações" em vez de cair. O erro tipado [`DatasetError`] existe
//! para quem quiser distinguir as causas, mas nunca atravessa
//! [`PlaceDataset::load`].
//!
//! O snapshot é construído uma única vez no início do processo e passado por
//! referência a cada requisição — não há global escondido nem recarga.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

use crate::place::{resolve_identity, Place, CATEGORY_HOTPLE, CATEGORY_NEUJOH};

/// Falhas possíveis ao ler uma fonte de dados.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// O arquivo não existe no diretório de dados.
    #[error("arquivo de dados não encontrado: {0}")]
    NotFound(PathBuf),
    /// O arquivo existe mas não pôde ser lido.
    #[error("falha ao ler {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// O conteúdo não é JSON válido.
    #[error("falha ao interpretar {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot imutável das quatro fontes, já normalizado.
#[derive(Debug, Clone, Default)]
pub struct PlaceDataset {
    /// Lugares da categoria "느좋", com a tag de origem injetada.
    pub neujoh_all: Vec<Place>,
    /// Lugares da categoria "핫플", com a tag de origem injetada.
    pub hotple_all: Vec<Place>,
    /// Identidades "느좋" na faixa dos 20% menos visíveis.
    pub neujoh_low: Vec<String>,
    /// Identidades "핫플" na faixa dos 20% menos visíveis.
    pub hotple_low: Vec<String>,
}

impl PlaceDataset {
    /// Carrega o snapshot a partir de um diretório de dados.
    ///
    /// Cada fonte que faltar ou estiver malformada degrada para vazia; a
    /// carga em si nunca falha.
    pub fn load(data_dir: &Path) -> PlaceDataset {
        let raw_neujoh = load_json(data_dir, "dobong_neujoh.json");
        let raw_hotple = load_json(data_dir, "dobong_hotple.json");
        let raw_neujoh_low = load_json(data_dir, "dobong_neujoh_in_low.json");
        let raw_hotple_low = load_json(data_dir, "dobong_hotple_in_low.json");

        PlaceDataset::from_raw(
            raw_neujoh.unwrap_or_else(|_| fallback_value("dobong_neujoh.json")),
            raw_hotple.unwrap_or_else(|_| fallback_value("dobong_hotple.json")),
            raw_neujoh_low.unwrap_or_else(|_| fallback_value("dobong_neujoh_in_low.json")),
            raw_hotple_low.unwrap_or_else(|_| fallback_value("dobong_hotple_in_low.json")),
        )
    }

    /// Constrói o snapshot a partir de valores JSON brutos.
    ///
    /// É o mesmo caminho de normalização usado por [`PlaceDataset::load`];
    /// útil em testes e para dados embutidos.
    pub fn from_raw(
        raw_neujoh: Value,
        raw_hotple: Value,
        raw_neujoh_low: Value,
        raw_hotple_low: Value,
    ) -> PlaceDataset {
        let mut neujoh_all = normalize_places(extract_records(&raw_neujoh));
        let mut hotple_all = normalize_places(extract_records(&raw_hotple));

        // Injeção da tag de origem (o passo central da carga)
        ensure_category_tag(&mut neujoh_all, CATEGORY_NEUJOH);
        ensure_category_tag(&mut hotple_all, CATEGORY_HOTPLE);

        PlaceDataset {
            neujoh_all,
            hotple_all,
            neujoh_low: normalize_identities(extract_records(&raw_neujoh_low)),
            hotple_low: normalize_identities(extract_records(&raw_hotple_low)),
        }
    }

    /// `true` quando qualquer uma das quatro fontes tem conteúdo.
    pub fn is_loaded(&self) -> bool {
        !self.neujoh_all.is_empty()
            || !self.hotple_all.is_empty()
            || !self.neujoh_low.is_empty()
            || !self.hotple_low.is_empty()
    }
}

/// Lê e interpreta um arquivo JSON do diretório de dados.
pub fn load_json(data_dir: &Path, filename: &str) -> Result<Value, DatasetError> {
    let path = data_dir.join(filename);
    let text = fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound(path.clone())
        } else {
            DatasetError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| DatasetError::Malformed { path, source })
}

/// Valor de fallback para uma fonte ausente ou malformada.
///
/// Fontes GeoJSON degradam para uma `FeatureCollection` vazia, as demais
/// para uma lista vazia.
fn fallback_value(filename: &str) -> Value {
    if filename.ends_with(".geojson") {
        json!({ "type": "FeatureCollection", "features": [] })
    } else {
        json!([])
    }
}

/// Chaves reconhecidas de objetos que embrulham a lista de registros.
const LIST_KEYS: &[&str] = &["data", "results", "items", "places", "list"];

/// Extrai a lista de registros de um valor JSON de forma arbitrária.
///
/// Aceita: lista plana; objeto com a lista sob uma das chaves reconhecidas
/// (`data`, `results`, `items`, `places`, `list`); ou o formato GeoJSON com
/// a lista sob `features`. Qualquer outra forma rende lista vazia.
pub fn extract_records(value: &Value) -> Vec<Value> {
    if let Value::Array(items) = value {
        return items.clone();
    }
    if let Value::Object(map) = value {
        for key in LIST_KEYS {
            if let Some(Value::Array(items)) = map.get(*key) {
                return items.clone();
            }
        }
        if let Some(Value::Array(features)) = map.get("features") {
            return features.clone();
        }
    }
    vec![]
}

/// Normaliza registros brutos em [`Place`]s (ver [`Place::from_value`]).
pub fn normalize_places(records: Vec<Value>) -> Vec<Place> {
    records.into_iter().map(Place::from_value).collect()
}

/// Normaliza uma lista de baixa visibilidade em identidades puras.
///
/// Entradas estruturadas passam pela mesma cadeia de prioridade de
/// identidade dos lugares; entradas primitivas viram a string do valor.
/// Entradas estruturadas sem identidade resolúvel são descartadas.
pub fn normalize_identities(records: Vec<Value>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(|value| {
            if value.is_object() {
                let place = Place::from_value(value);
                resolve_identity(&place).map(str::to_string)
            } else {
                crate::place::scalar_to_string(&value)
            }
        })
        .collect()
}

/// Injeta a tag da categoria de origem em cada registro, uma única vez.
///
/// A injeção é idempotente (tag já presente não é duplicada) e
/// `main_category` só é gravada quando ausente — a primeira escrita vence.
pub fn ensure_category_tag(places: &mut [Place], tag: &str) {
    for place in places.iter_mut() {
        if !place.tags.iter().any(|t| t == tag) {
            place.tags.push(tag.to_string());
        }
        if place.main_category.is_none() {
            place.main_category = Some(tag.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_flat_list() {
        let records = extract_records(&json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_extract_wrapped_list() {
        for key in ["data", "results", "items", "places", "list"] {
            let records = extract_records(&json!({ key: [{"id": "a"}] }));
            assert_eq!(records.len(), 1, "chave '{key}' deveria ser reconhecida");
        }
    }

    #[test]
    fn test_extract_feature_collection() {
        let records = extract_records(&json!({
            "type": "FeatureCollection",
            "features": [{"properties": {"name": "도봉산"}}]
        }));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_extract_unrecognized_shape_is_empty() {
        assert!(extract_records(&json!({"foo": "bar"})).is_empty());
        assert!(extract_records(&json!("texto solto")).is_empty());
        assert!(extract_records(&json!(null)).is_empty());
    }

    #[test]
    fn test_category_tag_injection_is_idempotent() {
        let mut places = normalize_places(vec![
            json!({"id": "a", "tags": ["공원"]}),
            json!({"id": "b", "tags": ["느좋"]}),
        ]);
        ensure_category_tag(&mut places, "느좋");
        ensure_category_tag(&mut places, "느좋");

        assert_eq!(places[0].tags, vec!["공원", "느좋"]);
        // Já tinha a tag: não duplica
        assert_eq!(places[1].tags, vec!["느좋"]);
        assert_eq!(places[0].main_category.as_deref(), Some("느좋"));
    }

    #[test]
    fn test_main_category_first_write_wins() {
        let mut places = normalize_places(vec![json!({"id": "a", "main_category": "핫플"})]);
        ensure_category_tag(&mut places, "느좋");
        assert_eq!(places[0].main_category.as_deref(), Some("핫플"));
    }

    #[test]
    fn test_identities_from_mixed_list() {
        let ids = normalize_identities(vec![
            json!("서울창포원"),
            json!({"placeId": "g7"}),
            json!({"address": "sem identidade"}),
            json!(42),
        ]);
        assert_eq!(ids, vec!["서울창포원", "g7", "42"]);
    }

    #[test]
    fn test_load_missing_sources_degrade_to_empty() {
        let dataset = PlaceDataset::load(Path::new("/caminho/que/nao/existe"));
        assert!(!dataset.is_loaded());
        assert!(dataset.neujoh_all.is_empty());
        assert!(dataset.hotple_low.is_empty());
    }

    #[test]
    fn test_from_raw_normalizes_and_tags() {
        let dataset = PlaceDataset::from_raw(
            json!({"places": ["서울창포원", {"id": "p1", "name": "무수골"}]}),
            json!([{"id": "h1", "name": "카페온다", "tags": ["카페"]}]),
            json!(["p1"]),
            json!([]),
        );
        assert_eq!(dataset.neujoh_all.len(), 2);
        assert!(dataset.neujoh_all[0].tags.contains(&"느좋".to_string()));
        assert!(dataset.hotple_all[0].tags.contains(&"핫플".to_string()));
        assert_eq!(dataset.hotple_all[0].tags, vec!["카페", "핫플"]);
        assert_eq!(dataset.neujoh_low, vec!["p1"]);
        assert!(dataset.is_loaded());
    }

    #[test]
    fn test_malformed_json_degrades_to_empty() {
        let dir = std::env::temp_dir().join("dobong-test-malformed");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("dobong_neujoh.json"), "{ isso não é json").unwrap();

        let dataset = PlaceDataset::load(&dir);
        assert!(dataset.neujoh_all.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
