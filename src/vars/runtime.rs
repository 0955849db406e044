use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RANDOM_INT_DEFAULT_MIN: i64 = 1;
const RANDOM_INT_DEFAULT_MAX: i64 = 1000;
const RANDOM_STRING_DEFAULT_LEN: usize = 10;
const RANDOM_STRING_MAX_LEN: usize = 4096;
/// Odd 64-bit golden-ratio constant; spreads request positions across seeds.
const REQUEST_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Values injected per invocation, above every scoped variable.
///
/// Random pseudo-variables draw from a generator seeded with `seed`, so
/// resolving the same template with the same context always yields the
/// same output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeContext {
    iteration: u64,
    thread_num: u64,
    timestamp_ms: i64,
    seed: u64,
}

impl RuntimeContext {
    /// Context for `iteration` (0-based) of virtual user `thread_num`
    /// (1-based), stamped with the current wall clock and a fresh seed.
    #[must_use]
    pub fn now(iteration: u64, thread_num: u64) -> Self {
        Self {
            iteration,
            thread_num,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            seed: rand::thread_rng().r#gen(),
        }
    }

    #[must_use]
    pub const fn fixed(iteration: u64, thread_num: u64, timestamp_ms: i64, seed: u64) -> Self {
        Self {
            iteration,
            thread_num,
            timestamp_ms,
            seed,
        }
    }

    /// Context for the request at `position` within the iteration. Each
    /// position gets its own random stream; position 0 keeps the iteration
    /// seed.
    #[must_use]
    pub const fn for_request(self, position: u64) -> Self {
        Self {
            seed: self.seed ^ position.wrapping_mul(REQUEST_SEED_STRIDE),
            ..self
        }
    }

    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    #[must_use]
    pub const fn thread_num(&self) -> u64 {
        self.thread_num
    }

    #[must_use]
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub(super) fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Value of a runtime pseudo-variable, or `None` when `name` is not one.
    pub(super) fn evaluate(
        &self,
        name: &str,
        args: Option<&str>,
        rng: &mut StdRng,
    ) -> Option<String> {
        match (name, args) {
            ("iteration", None) => Some(self.iteration.to_string()),
            ("threadNum", None) => Some(self.thread_num.to_string()),
            ("timestamp", None) => Some(self.timestamp_ms.to_string()),
            ("uuid", None) => Some(random_uuid(rng)),
            ("randomInt", args) => {
                let (min, max) = args.and_then(parse_int_range).unwrap_or((
                    RANDOM_INT_DEFAULT_MIN,
                    RANDOM_INT_DEFAULT_MAX,
                ));
                Some(rng.gen_range(min..=max).to_string())
            }
            ("randomString", args) => {
                let len = args
                    .and_then(parse_length)
                    .unwrap_or(RANDOM_STRING_DEFAULT_LEN);
                Some(
                    (0..len)
                        .map(|_| char::from(rng.sample(Alphanumeric)))
                        .collect(),
                )
            }
            _ => None,
        }
    }
}

fn parse_int_range(args: &str) -> Option<(i64, i64)> {
    let mut parts = args.split(',').map(str::trim);
    let min = parts.next()?.parse::<i64>().ok()?;
    let max = parts.next()?.parse::<i64>().ok()?;
    if parts.next().is_some() || min > max {
        return None;
    }
    Some((min, max))
}

fn parse_length(args: &str) -> Option<usize> {
    args.trim()
        .parse::<usize>()
        .ok()
        .filter(|len| (1..=RANDOM_STRING_MAX_LEN).contains(len))
}

fn random_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.r#gen())
        .into_uuid()
        .hyphenated()
        .to_string()
}
