//! # Orquestrador de Recomendações
//!
//! O [`Recommender`] conecta o repositório ao motor de pontuação:
//!
//! 1. mescla as duas listas de categoria em um mapa por identidade
//!    (última fonte vence em colisão, posição da primeira inserção mantida);
//! 2. monta o conjunto de identidades escondidas (união das listas de baixa
//!    visibilidade das duas categorias);
//! 3. deduz o viés solicitado a partir da categoria explícita ou da
//!    palavra-chave;
//! 4. invoca [`score_places`](crate::scoring::score_places) e aplica a
//!    janela de paginação `[offset, offset + k)`.
//!
//! A paginação é o que permite ao chat percorrer "Top 1-5", "Top 6-10" etc.
//! em chamadas sucessivas: o chamador guarda apenas o offset (e a seed, se
//! quiser reprodutibilidade entre as páginas).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::place::{resolve_identity, Place, CATEGORY_HOTPLE, CATEGORY_NEUJOH};
use crate::repository::PlaceDataset;
use crate::scoring::score_places;

/// Contagens do snapshot para o endpoint de saúde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub data_loaded: bool,
    pub hotple_count_all: usize,
    pub neujoh_count_all: usize,
    pub hotple_count_low: usize,
    pub neujoh_count_low: usize,
}

/// Serviço de recomendação sobre um snapshot imutável de dados.
#[derive(Debug, Clone)]
pub struct Recommender {
    dataset: PlaceDataset,
}

impl Recommender {
    pub fn new(dataset: PlaceDataset) -> Recommender {
        Recommender { dataset }
    }

    /// Recomenda lugares, já pontuados, ordenados e paginados.
    ///
    /// - `category`: uma das duas categorias, quando o chamador já sabe o
    ///   viés ("느좋" ou "핫플"); qualquer outro valor é ignorado;
    /// - `keyword`: texto livre usado no viés e na distribuição de frações;
    /// - `user_location`: aceito para compatibilidade, ainda sem peso;
    /// - `k`/`offset`: janela de paginação; valores negativos são tratados
    ///   como zero, offset além do fim rende lista vazia, sem wraparound;
    /// - `seed`: liga o jitter reprodutível do motor de pontuação.
    pub fn recommend(
        &self,
        category: Option<&str>,
        keyword: Option<&str>,
        user_location: Option<(f64, f64)>,
        k: i64,
        seed: Option<&str>,
        offset: i64,
    ) -> Vec<Place> {
        let merged = self.merge_by_identity();
        let low20_ids = self.low_visibility_ids();
        let low50_ids = HashSet::new(); // ponto de extensão: sem dados hoje
        let requested_bias = detect_requested_bias(category, keyword);

        let scored = score_places(
            &merged,
            &low20_ids,
            &low50_ids,
            keyword,
            user_location,
            seed,
            requested_bias,
        );

        let start = offset.max(0) as usize;
        let len = k.max(0) as usize;
        scored.into_iter().skip(start).take(len).collect()
    }

    /// Contagens do snapshot, usadas pelo health-check externo.
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus {
            data_loaded: self.dataset.is_loaded(),
            hotple_count_all: self.dataset.hotple_all.len(),
            neujoh_count_all: self.dataset.neujoh_all.len(),
            hotple_count_low: self.dataset.hotple_low.len(),
            neujoh_count_low: self.dataset.neujoh_low.len(),
        }
    }

    /// Mescla as duas listas de categoria por identidade resolvida.
    ///
    /// Processa "핫플" primeiro e "느좋" depois: em colisão de identidade a
    /// última fonte vence, mantendo a posição da primeira inserção (mesma
    /// semântica de sobrescrita de um mapa ordenado por inserção). O
    /// resultado tem ordem determinística, exigida pelo jitter com seed.
    fn merge_by_identity(&self) -> Vec<Place> {
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, &Place> = HashMap::new();

        let sources = self.dataset.hotple_all.iter().chain(self.dataset.neujoh_all.iter());
        for place in sources {
            let Some(pid) = resolve_identity(place) else {
                continue;
            };
            if merged.insert(pid.to_string(), place).is_none() {
                order.push(pid.to_string());
            }
        }

        order.iter().map(|pid| merged[pid].clone()).collect()
    }

    /// União das identidades de baixa visibilidade das duas categorias.
    fn low_visibility_ids(&self) -> HashSet<String> {
        self.dataset
            .hotple_low
            .iter()
            .chain(self.dataset.neujoh_low.iter())
            .cloned()
            .collect()
    }
}

/// Deduz o viés solicitado: categoria explícita, senão palavra-chave que
/// seja (ou contenha) o nome de uma das duas categorias.
fn detect_requested_bias(category: Option<&str>, keyword: Option<&str>) -> Option<&'static str> {
    const CATEGORIES: [&str; 2] = [CATEGORY_NEUJOH, CATEGORY_HOTPLE];

    if let Some(cat) = category {
        if let Some(found) = CATEGORIES.iter().copied().find(|c| *c == cat) {
            return Some(found);
        }
    }
    if let Some(kw) = keyword {
        if let Some(found) = CATEGORIES.iter().copied().find(|c| kw.contains(*c)) {
            return Some(found);
        }
    }
    None
}
