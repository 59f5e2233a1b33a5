//! Deterministic structural hash of query descriptors.
#![expect(clippy::cast_possible_truncation)]

use crate::{
    db::query::{
        JoinKind, NullOrdering, OrderDirection, Predicate, QueryDescriptor,
        expr::{AggregateFunc, ArithOp, BinaryOp, CompareOp, Expr, UnaryOp},
    },
    value::Value,
};
use sha2::{Digest, Sha256};
use std::fmt;

///
/// QueryFingerprint
///
/// SHA-256 over a tagged encoding of a descriptor. Equal descriptors share
/// a fingerprint; it is what trace events report as query identity.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct QueryFingerprint([u8; 32]);

impl QueryFingerprint {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

pub(super) fn fingerprint(query: &QueryDescriptor) -> QueryFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(b"queryfp:v1");
    hash_query(&mut hasher, query);

    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);

    QueryFingerprint(out)
}

fn hash_query(hasher: &mut Sha256, query: &QueryDescriptor) {
    write_tag(hasher, 0x01);
    write_exprs(hasher, query.projection());

    write_tag(hasher, 0x02);
    write_u32(hasher, query.sources().len() as u32);
    for source in query.sources() {
        write_str(hasher, source.alias());
        write_str(hasher, source.model().name);
    }

    write_tag(hasher, 0x03);
    write_u32(hasher, query.joins().len() as u32);
    for join in query.joins() {
        write_tag(hasher, join_kind_tag(join.kind()));
        write_str(hasher, join.alias());
        write_str(hasher, join.target().name);
        match join.association() {
            Some(path) => {
                write_tag(hasher, 0x01);
                write_str(hasher, path.alias());
                write_str(hasher, path.root().name);
                write_u32(hasher, path.via().len() as u32);
                for hop in path.via() {
                    write_str(hasher, hop);
                }
            }
            None => write_tag(hasher, 0x00),
        }
        write_predicate(hasher, join.condition());
        write_tag(hasher, u8::from(join.is_fetch()));
    }

    write_tag(hasher, 0x04);
    write_predicate(hasher, query.filter());

    write_tag(hasher, 0x05);
    write_exprs(hasher, query.group_by());

    write_tag(hasher, 0x06);
    write_predicate(hasher, query.having());

    write_tag(hasher, 0x07);
    write_u32(hasher, query.order_by().len() as u32);
    for order in query.order_by() {
        hash_expr(hasher, order.expr());
        write_tag(
            hasher,
            match order.direction() {
                OrderDirection::Asc => 0x01,
                OrderDirection::Desc => 0x02,
            },
        );
        write_tag(
            hasher,
            match order.null_ordering() {
                None => 0x00,
                Some(NullOrdering::First) => 0x01,
                Some(NullOrdering::Last) => 0x02,
            },
        );
    }

    write_tag(hasher, 0x08);
    write_opt_u64(hasher, query.offset());
    write_opt_u64(hasher, query.limit());
    write_tag(hasher, u8::from(query.is_distinct()));
}

fn hash_expr(hasher: &mut Sha256, expr: &Expr) {
    match expr {
        Expr::Literal(value) => {
            write_tag(hasher, 0x20);
            write_value(hasher, value);
        }
        Expr::Field(path) => {
            write_tag(hasher, 0x21);
            write_str(hasher, path.alias());
            write_str(hasher, path.root());
            write_u32(hasher, path.via().len() as u32);
            for hop in path.via() {
                write_str(hasher, hop);
            }
            write_str(hasher, path.field());
        }
        Expr::Entity(entity) => {
            write_tag(hasher, 0x22);
            write_str(hasher, entity.alias());
            write_str(hasher, entity.entity());
        }
        Expr::Unary { op, expr } => {
            write_tag(hasher, 0x23);
            write_tag(hasher, unary_tag(*op));
            hash_expr(hasher, expr);
        }
        Expr::Binary { op, left, right } => {
            write_tag(hasher, 0x24);
            write_tag(hasher, binary_tag(*op));
            hash_expr(hasher, left);
            hash_expr(hasher, right);
        }
        Expr::Between { expr, low, high } => {
            write_tag(hasher, 0x25);
            hash_expr(hasher, expr);
            hash_expr(hasher, low);
            hash_expr(hasher, high);
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            write_tag(hasher, 0x26);
            write_tag(hasher, u8::from(*negated));
            hash_expr(hasher, expr);
            write_exprs(hasher, list);
        }
        Expr::InSubquery {
            expr,
            subquery,
            negated,
        } => {
            write_tag(hasher, 0x27);
            write_tag(hasher, u8::from(*negated));
            hash_expr(hasher, expr);
            hash_query(hasher, subquery.query());
        }
        Expr::Exists(subquery) => {
            write_tag(hasher, 0x28);
            hash_query(hasher, subquery.query());
        }
        Expr::Aggregate { func, arg } => {
            write_tag(hasher, 0x29);
            write_tag(hasher, aggregate_tag(*func));
            match arg {
                Some(arg) => hash_expr(hasher, arg),
                None => write_tag(hasher, 0x00),
            }
        }
        Expr::Case(case) => {
            write_tag(hasher, 0x2A);
            match case.operand() {
                Some(operand) => hash_expr(hasher, operand),
                None => write_tag(hasher, 0x00),
            }
            write_u32(hasher, case.arms().len() as u32);
            for (when, then) in case.arms() {
                hash_expr(hasher, when);
                hash_expr(hasher, then);
            }
            hash_expr(hasher, case.otherwise());
        }
        Expr::Subquery(subquery) => {
            write_tag(hasher, 0x2B);
            hash_query(hasher, subquery.query());
        }
        Expr::Labeled { expr, label } => {
            write_tag(hasher, 0x2C);
            write_str(hasher, label);
            hash_expr(hasher, expr);
        }
    }
}

fn write_exprs(hasher: &mut Sha256, exprs: &[Expr]) {
    write_u32(hasher, exprs.len() as u32);
    for expr in exprs {
        hash_expr(hasher, expr);
    }
}

fn write_predicate(hasher: &mut Sha256, predicate: Option<&Predicate>) {
    match predicate {
        Some(predicate) => {
            write_tag(hasher, 0x01);
            hash_expr(hasher, predicate.expr());
        }
        None => write_tag(hasher, 0x00),
    }
}

fn write_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => write_tag(hasher, 0x00),
        Value::Bool(b) => {
            write_tag(hasher, 0x01);
            write_tag(hasher, u8::from(*b));
        }
        Value::Int(v) => {
            write_tag(hasher, 0x02);
            hasher.update(v.to_be_bytes());
        }
        Value::Float(v) => {
            write_tag(hasher, 0x03);
            hasher.update(v.get().to_bits().to_be_bytes());
        }
        Value::Text(s) => {
            write_tag(hasher, 0x04);
            write_str(hasher, s);
        }
        Value::Key(k) => {
            write_tag(hasher, 0x05);
            hasher.update(k.get().to_be_bytes());
        }
        Value::Entity(entity) => {
            write_tag(hasher, 0x06);
            write_str(hasher, entity.model().name);
            write_opt_u64(hasher, entity.key().map(|key| key.get()));
        }
    }
}

fn write_opt_u64(hasher: &mut Sha256, value: Option<u64>) {
    match value {
        Some(value) => {
            write_tag(hasher, 0x01);
            hasher.update(value.to_be_bytes());
        }
        None => write_tag(hasher, 0x00),
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u32(hasher: &mut Sha256, value: u32) {
    hasher.update(value.to_be_bytes());
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

const fn join_kind_tag(kind: JoinKind) -> u8 {
    match kind {
        JoinKind::Inner => 0x01,
        JoinKind::Left => 0x02,
        JoinKind::Cartesian => 0x03,
    }
}

const fn unary_tag(op: UnaryOp) -> u8 {
    match op {
        UnaryOp::Not => 0x01,
        UnaryOp::Neg => 0x02,
        UnaryOp::IsNull => 0x03,
        UnaryOp::IsNotNull => 0x04,
        UnaryOp::ToText => 0x05,
    }
}

const fn binary_tag(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Compare(op) => match op {
            CompareOp::Eq => 0x01,
            CompareOp::Ne => 0x02,
            CompareOp::Gt => 0x03,
            CompareOp::Goe => 0x04,
            CompareOp::Lt => 0x05,
            CompareOp::Loe => 0x06,
        },
        BinaryOp::Arith(op) => match op {
            ArithOp::Add => 0x10,
            ArithOp::Sub => 0x11,
            ArithOp::Mul => 0x12,
            ArithOp::Div => 0x13,
        },
        BinaryOp::And => 0x20,
        BinaryOp::Or => 0x21,
        BinaryOp::Concat => 0x30,
        BinaryOp::StartsWith => 0x31,
        BinaryOp::Contains => 0x32,
    }
}

const fn aggregate_tag(func: AggregateFunc) -> u8 {
    match func {
        AggregateFunc::Count => 0x01,
        AggregateFunc::Sum => 0x02,
        AggregateFunc::Avg => 0x03,
        AggregateFunc::Min => 0x04,
        AggregateFunc::Max => 0x05,
    }
}
