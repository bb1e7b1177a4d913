//! # Motor de Pontuação — Sinais Ponderados e Ordenação Estável
//!
//! Calcula uma pontuação composta por lugar a partir de múltiplos sinais e
//! devolve a lista ordenada de forma decrescente:
//!
//! 1. **Faixa de visibilidade** — bônus forte para os 20% menos visíveis,
//!    metade para os 50% (ponto de extensão, sem dados hoje);
//! 2. **Viés solicitado** — bônus fixo quando o usuário pediu explicitamente
//!    uma das duas categorias e o lugar carrega a tag;
//! 3. **Distribuição por palavra-chave** — bônus fracionado entre as duas
//!    categorias, aditivo com o viés (um lugar com as duas tags soma duas
//!    vezes);
//! 4. **Jitter aleatório** — perturbação pequena e reprodutível por seed,
//!    para variar as recomendações sem perder o determinismo.
//!
//! Distância ([`W_DIST`]) e diversidade ([`W_DIV`]) são pesos reservados,
//! ainda sem implementação: contribuem sempre zero.
//!
//! ## Cópia na pontuação
//!
//! O motor nunca muta os registros de entrada: cada lugar pontuado é uma
//! cópia com `band_label` e `final_score` preenchidos. Requisições
//! concorrentes sobre o mesmo snapshot não enxergam escritas umas das
//! outras.
//!
//! ## Determinismo
//!
//! Com a mesma seed e a mesma ordem de entrada, duas invocações produzem
//! exatamente a mesma saída, pontuações inclusas. A ordenação é estável:
//! empates preservam a ordem relativa de entrada.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::place::{resolve_identity, BandLabel, Place, CATEGORY_HOTPLE, CATEGORY_NEUJOH};

/// Peso do bônus de faixa de visibilidade.
pub const W_BAND: f64 = 0.55;
/// Peso base dos bônus de palavra-chave e de viés solicitado.
pub const W_KW: f64 = 0.25;
/// Peso reservado para distância até o usuário (não implementado).
pub const W_DIST: f64 = 0.10;
/// Peso reservado para diversidade de resultados (não implementado).
pub const W_DIV: f64 = 0.05;
/// Amplitude do jitter aleatório: uniforme em `[0, W_RAND)`.
pub const W_RAND: f64 = 0.05;

/// Mapa palavra-chave → distribuição de frações entre as duas categorias.
///
/// A lista é explicitamente ordenada: a correspondência é por substring
/// (a chave contida na palavra-chave do usuário) e a **primeira** entrada
/// que casar vence. As frações são bônus independentes, não uma
/// distribuição de probabilidade — não precisam somar 1.0.
pub const KEYWORD_TO_TAG_MAP: &[(&str, &[(&str, f64)])] = &[
    ("친구", &[(CATEGORY_NEUJOH, 0.4), (CATEGORY_HOTPLE, 0.6)]),
    ("연인", &[(CATEGORY_NEUJOH, 0.6), (CATEGORY_HOTPLE, 0.4)]), // híbrido
    ("데이트", &[(CATEGORY_HOTPLE, 1.0)]),
    ("카페", &[(CATEGORY_HOTPLE, 1.0)]),
    ("맛집", &[(CATEGORY_HOTPLE, 1.0)]),
    ("가족", &[(CATEGORY_NEUJOH, 1.0)]),
    ("조용한", &[(CATEGORY_NEUJOH, 1.0)]),
    ("둘레길", &[(CATEGORY_NEUJOH, 1.0)]),
    ("공원", &[(CATEGORY_NEUJOH, 1.0)]),
    ("자연", &[(CATEGORY_NEUJOH, 1.0)]),
    ("정원", &[(CATEGORY_NEUJOH, 1.0)]),
    ("야경", &[(CATEGORY_NEUJOH, 1.0)]),
];

/// Busca a distribuição da primeira chave do mapa contida na palavra-chave.
fn keyword_distribution(keyword: &str) -> Option<&'static [(&'static str, f64)]> {
    KEYWORD_TO_TAG_MAP
        .iter()
        .find(|entry| keyword.contains(entry.0))
        .map(|entry| entry.1)
}

/// Deriva a seed do gerador a partir de uma seed textual qualquer.
fn seed_to_u64(seed: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Pontua e ordena os lugares (cópia na pontuação, ordenação estável).
///
/// - Registros sem identidade resolúvel são excluídos da saída;
/// - `seed` presente liga o jitter reprodutível; ausente, o jitter
///   contribui exatamente zero (ausência determinística, não aleatória);
/// - `user_location` é aceito mas ainda não pesa ([`W_DIST`] reservado);
/// - a pontuação final é sempre finita: soma de literais finitos mais um
///   sorteio limitado a `[0, W_RAND)`.
///
/// A ordem de sorteio do jitter segue a ordem de entrada, então o
/// determinismo exige que `places` chegue em ordem estável (o orquestrador
/// usa ordem de inserção da mesclagem).
pub fn score_places(
    places: &[Place],
    low20_ids: &HashSet<String>,
    low50_ids: &HashSet<String>,
    keyword: Option<&str>,
    _user_location: Option<(f64, f64)>,
    seed: Option<&str>,
    requested_bias: Option<&str>,
) -> Vec<Place> {
    let target_weights = keyword.and_then(keyword_distribution);
    let mut rng = seed.map(|s| StdRng::seed_from_u64(seed_to_u64(s)));

    let mut scored: Vec<Place> = Vec::with_capacity(places.len());

    for place in places {
        let Some(pid) = resolve_identity(place) else {
            continue; // sem identidade: não dá para deduplicar nem pontuar
        };

        let mut score = 0.0;

        // === Passo 1: faixa de visibilidade (mutuamente exclusiva) ===
        let band = if low20_ids.contains(pid) {
            score += W_BAND;
            BandLabel::Hidden20
        } else if low50_ids.contains(pid) {
            score += W_BAND * 0.5;
            BandLabel::Hidden50
        } else {
            BandLabel::Normal
        };

        // === Passo 2: viés solicitado + distribuição por palavra-chave ===
        if let Some(bias) = requested_bias {
            if (bias == CATEGORY_NEUJOH || bias == CATEGORY_HOTPLE)
                && place.tags.iter().any(|t| t == bias)
            {
                score += W_KW * 0.9;
            }
        }

        if let Some(dist) = target_weights {
            for &(tag, frac) in dist {
                if place.tags.iter().any(|t| t == tag) {
                    score += W_KW * frac;
                }
            }
        }

        // === Passo 3: distância e diversidade (pesos reservados) ===

        // === Passo 4: jitter reprodutível ===
        if let Some(rng) = rng.as_mut() {
            score += rng.gen::<f64>() * W_RAND;
        }

        let mut out = place.clone();
        out.band_label = Some(band);
        out.final_score = Some(score);
        scored.push(out);
    }

    // Ordenação estável decrescente: empates mantêm a ordem de entrada
    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(id: &str, tags: &[&str]) -> Place {
        Place::from_value(json!({ "id": id, "tags": tags }))
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn order_of(scored: &[Place]) -> Vec<&str> {
        scored.iter().filter_map(|p| p.id.as_deref()).collect()
    }

    #[test]
    fn test_empty_input_empty_output() {
        let scored = score_places(&[], &ids(&["a"]), &HashSet::new(), Some("가족"), None, Some("1"), None);
        assert!(scored.is_empty());
    }

    #[test]
    fn test_family_keyword_scenario() {
        // "a" é escondido e casa "가족" → {느좋: 1.0}: 0.55 + 0.25 = 0.80
        let places = vec![place("a", &["느좋"]), place("b", &["핫플"])];
        let scored = score_places(&places, &ids(&["a"]), &HashSet::new(), Some("가족"), None, None, None);

        assert_eq!(order_of(&scored), vec!["a", "b"]);
        assert!((scored[0].final_score.unwrap() - 0.80).abs() < 1e-9);
        assert_eq!(scored[1].final_score, Some(0.0));
    }

    #[test]
    fn test_friend_keyword_hybrid_split() {
        // "친구" → {느좋: 0.4, 핫플: 0.6}: o lado 핫플 (0.15) vence o 느좋 (0.10)
        let places = vec![place("calm", &["느좋"]), place("hot", &["핫플"])];
        let scored = score_places(&places, &HashSet::new(), &HashSet::new(), Some("친구"), None, None, None);

        assert_eq!(order_of(&scored), vec!["hot", "calm"]);
        assert!((scored[0].final_score.unwrap() - 0.15).abs() < 1e-9);
        assert!((scored[1].final_score.unwrap() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_substring_match_first_entry_wins() {
        // A chave do mapa precisa estar contida na palavra-chave do usuário
        let places = vec![place("a", &["핫플"])];
        let scored = score_places(
            &places,
            &HashSet::new(),
            &HashSet::new(),
            Some("브런치 카페 추천"),
            None,
            None,
            None,
        );
        assert!((scored[0].final_score.unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_bias_and_distribution_are_additive() {
        // Viés 핫플 (0.225) + fração 핫플 de "친구" (0.15) = 0.375
        let places = vec![place("a", &["핫플"])];
        let scored = score_places(
            &places,
            &HashSet::new(),
            &HashSet::new(),
            Some("친구"),
            None,
            None,
            Some("핫플"),
        );
        assert!((scored[0].final_score.unwrap() - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_hybrid_place_with_both_tags_sums_twice() {
        // Um lugar com as duas tags soma as duas frações: 0.25 * (0.4 + 0.6)
        let places = vec![place("a", &["느좋", "핫플"])];
        let scored = score_places(&places, &HashSet::new(), &HashSet::new(), Some("친구"), None, None, None);
        assert!((scored[0].final_score.unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_band_exclusivity_and_precedence() {
        let places = vec![place("a", &[]), place("b", &[]), place("c", &[])];
        // "a" está nas duas faixas: a dos 20% tem precedência
        let scored = score_places(&places, &ids(&["a"]), &ids(&["a", "b"]), None, None, None, None);

        let by_id = |id: &str| scored.iter().find(|p| p.id.as_deref() == Some(id)).unwrap();
        assert_eq!(by_id("a").band_label, Some(BandLabel::Hidden20));
        assert_eq!(by_id("b").band_label, Some(BandLabel::Hidden50));
        assert_eq!(by_id("c").band_label, Some(BandLabel::Normal));
        assert!((by_id("a").final_score.unwrap() - W_BAND).abs() < 1e-9);
        assert!((by_id("b").final_score.unwrap() - W_BAND * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_identity_dropped() {
        let anonymous = Place::from_value(json!({ "address": "도봉로 1" }));
        let places = vec![anonymous, place("a", &[])];
        let scored = score_places(&places, &HashSet::new(), &HashSet::new(), None, None, None, None);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_no_seed_zero_jitter() {
        let places = vec![place("a", &[]), place("b", &[])];
        let scored = score_places(&places, &HashSet::new(), &HashSet::new(), None, None, None, None);
        assert!(scored.iter().all(|p| p.final_score == Some(0.0)));
    }

    #[test]
    fn test_seed_determinism() {
        let places: Vec<Place> = (0..20).map(|i| place(&format!("p{i}"), &["느좋"])).collect();
        let run = || {
            score_places(&places, &ids(&["p3", "p7"]), &HashSet::new(), Some("연인"), None, Some("seed-42"), None)
        };
        let first = run();
        let second = run();
        assert_eq!(order_of(&first), order_of(&second));
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.final_score, b.final_score);
        }
        // E o jitter de fato é limitado a [0, W_RAND)
        for p in &first {
            let band_bonus = if p.band_label == Some(BandLabel::Hidden20) { W_BAND } else { 0.0 };
            let base = band_bonus + W_KW * 0.6;
            let jitter = p.final_score.unwrap() - base;
            assert!((0.0..W_RAND).contains(&jitter), "jitter fora da faixa: {jitter}");
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let places: Vec<Place> = (0..10).map(|i| place(&format!("p{i}"), &[])).collect();
        let a = score_places(&places, &HashSet::new(), &HashSet::new(), None, None, Some("1"), None);
        let b = score_places(&places, &HashSet::new(), &HashSet::new(), None, None, Some("2"), None);
        assert_ne!(
            a.iter().map(|p| p.final_score).collect::<Vec<_>>(),
            b.iter().map(|p| p.final_score).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_stable_sort_preserves_input_order_on_ties() {
        // Sem seed e sem sinais, tudo empata em 0.0: a ordem de entrada fica
        let places = vec![place("x", &[]), place("y", &[]), place("z", &[])];
        let scored = score_places(&places, &HashSet::new(), &HashSet::new(), None, None, None, None);
        assert_eq!(order_of(&scored), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_input_records_not_mutated() {
        let places = vec![place("a", &[])];
        let _ = score_places(&places, &ids(&["a"]), &HashSet::new(), None, None, None, None);
        // Cópia na pontuação: o registro de origem permanece intocado
        assert_eq!(places[0].band_label, None);
        assert_eq!(places[0].final_score, None);
    }

    #[test]
    fn test_scores_always_finite() {
        let places: Vec<Place> = (0..50).map(|i| place(&format!("p{i}"), &["느좋", "핫플"])).collect();
        let scored = score_places(&places, &ids(&["p0"]), &HashSet::new(), Some("친구"), None, Some("s"), Some("느좋"));
        assert!(scored.iter().all(|p| p.final_score.unwrap().is_finite()));
    }
}
