use super::{RuntimeContext, VariableScope};

const OPEN: &str = "${";
const CLOSE: char = '}';

struct Token<'tpl> {
    raw: &'tpl str,
    name: &'tpl str,
    args: Option<&'tpl str>,
}

/// Substitutes every `${name}` / `${name(args)}` in `template`.
///
/// Runtime pseudo-variables win over scoped ones. Tokens that match nothing,
/// or that are not well-formed, are copied through untouched; substituted
/// values are never scanned again.
#[must_use]
pub fn resolve(template: &str, scope: &VariableScope, runtime: &RuntimeContext) -> String {
    if !template.contains(OPEN) {
        return template.to_owned();
    }
    let mut rng = runtime.rng();
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let Some(start) = rest.find(OPEN) else {
            output.push_str(rest);
            break;
        };
        let (before, from_marker) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = from_marker.strip_prefix(OPEN) else {
            output.push_str(from_marker);
            break;
        };
        let Some((token, remaining)) = parse_token(after) else {
            output.push_str(OPEN);
            rest = after;
            continue;
        };

        if let Some(value) = runtime.evaluate(token.name, token.args, &mut rng) {
            output.push_str(&value);
        } else if let Some(value) = scoped_value(scope, &token) {
            output.push_str(value);
        } else {
            output.push_str(OPEN);
            output.push_str(token.raw);
            output.push(CLOSE);
        }
        rest = remaining;
    }

    output
}

/// True when some `${` in `template` is not closed before the next `${`
/// or the end of the string.
#[must_use]
pub fn has_unterminated_reference(template: &str) -> bool {
    let mut rest = template;
    while let Some(start) = rest.find(OPEN) {
        let after = rest.get(start.saturating_add(OPEN.len())..).unwrap_or_default();
        let Some(end) = after.find(CLOSE) else {
            return true;
        };
        if after.find(OPEN).is_some_and(|next| next < end) {
            return true;
        }
        rest = after.get(end.saturating_add(1)..).unwrap_or_default();
    }
    false
}

fn scoped_value<'scope>(scope: &'scope VariableScope, token: &Token<'_>) -> Option<&'scope str> {
    match token.args {
        None => scope.lookup(token.name),
        Some(_) => None,
    }
}

fn parse_token(after: &str) -> Option<(Token<'_>, &str)> {
    let end = after.find(CLOSE)?;
    let (inner, tail) = after.split_at(end);
    let remaining = tail.strip_prefix(CLOSE)?;

    let (name, args) = match inner.find('(') {
        Some(open) => {
            let (name, arg_part) = inner.split_at(open);
            let args = arg_part.strip_prefix('(')?.strip_suffix(')')?;
            (name, Some(args))
        }
        None => (inner, None),
    };
    if !is_identifier(name) {
        return None;
    }

    Some((
        Token {
            raw: inner,
            name,
            args,
        },
        remaining,
    ))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
}
