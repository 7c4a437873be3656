use std::fmt;

use crate::util::{
    fmt::{Context, Show},
    intern::Interned,
};

/// The structural type of a value, as computed by the checker.
#[derive(Clone, Debug, PartialEq)]
pub enum CodeType {
    Number,
    String,
    Boolean,
    Symbol,
    List(Box<CodeType>),
    Function(FunctionType),
    /// A nominal struct type, identified by the struct's name.
    Struct(Interned<str>),
    /// Always normalized through [`CodeType::collapse`] before being stored or
    /// compared.
    Union(Vec<CodeType>),
    /// The dynamic type. Accepts and produces anything.
    Any,
    /// Error recovery placeholder. Never produces further diagnostics.
    Flexible,
    /// The "type" of a definition.
    Void,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub args: Vec<Arg>,
    pub ret: Box<CodeType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub ty: CodeType,
    /// Whether this slot may match any number of call arguments (at least
    /// one).
    pub expandable: bool,
}

impl Arg {
    pub fn fixed(ty: CodeType) -> Arg {
        Arg {
            ty,
            expandable: false,
        }
    }

    pub fn expandable(ty: CodeType) -> Arg {
        Arg {
            ty,
            expandable: true,
        }
    }
}

/// The top-level discriminant of a [`CodeType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Number,
    String,
    Boolean,
    Symbol,
    List,
    Function,
    Struct,
    Union,
    Any,
    Flexible,
    Void,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Boolean => "boolean",
            Tag::Symbol => "symbol",
            Tag::List => "list",
            Tag::Function => "function",
            Tag::Struct => "struct",
            Tag::Union => "union",
            Tag::Any => "any",
            Tag::Flexible => "flexible",
            Tag::Void => "void",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl CodeType {
    pub fn list(subtype: CodeType) -> CodeType {
        CodeType::List(Box::new(subtype))
    }

    pub fn function(args: Vec<Arg>, ret: CodeType) -> CodeType {
        CodeType::Function(FunctionType {
            args,
            ret: Box::new(ret),
        })
    }

    /// Builds the collapsed union of the provided types.
    pub fn union(types: Vec<CodeType>) -> CodeType {
        CodeType::Union(types).collapse()
    }

    pub fn tag(&self) -> Tag {
        match self {
            CodeType::Number => Tag::Number,
            CodeType::String => Tag::String,
            CodeType::Boolean => Tag::Boolean,
            CodeType::Symbol => Tag::Symbol,
            CodeType::List(_) => Tag::List,
            CodeType::Function(_) => Tag::Function,
            CodeType::Struct(_) => Tag::Struct,
            CodeType::Union(_) => Tag::Union,
            CodeType::Any => Tag::Any,
            CodeType::Flexible => Tag::Flexible,
            CodeType::Void => Tag::Void,
        }
    }

    /// Normalizes a union into its canonical form.
    ///
    /// Nested unions are flattened. If any member is `any`, the whole union is
    /// `any`. Members are then de-duplicated by [`Tag`] only, keeping the first
    /// occurrence, so `list(number)` and `list(string)` collapse into the first
    /// of them. A single remaining member is returned unwrapped, and an empty
    /// union becomes `flexible`. Non-union types are returned as is.
    #[must_use]
    pub fn collapse(self) -> CodeType {
        let CodeType::Union(types) = self else {
            return self;
        };

        let mut flat = Vec::with_capacity(types.len());
        for ty in types {
            match ty.collapse() {
                CodeType::Union(inner) => flat.extend(inner),
                ty => flat.push(ty),
            }
        }
        if flat.iter().any(|ty| matches!(ty, CodeType::Any)) {
            return CodeType::Any;
        }

        let mut members: Vec<CodeType> = Vec::with_capacity(flat.len());
        for ty in flat {
            if !members.iter().any(|seen| seen.tag() == ty.tag()) {
                members.push(ty);
            }
        }
        match members.len() {
            0 => CodeType::Flexible,
            1 => members.swap_remove(0),
            _ => CodeType::Union(members),
        }
    }

    /// Whether a value of type `self` may be used where `to` is expected.
    ///
    /// Struct types are compared by tag alone: any two struct types are
    /// compatible with each other.
    pub fn can_be(&self, to: &CodeType) -> bool {
        if matches!(to, CodeType::Any) || matches!(self, CodeType::Flexible) {
            return true;
        }
        match (self, to) {
            (_, CodeType::Union(targets)) => targets.iter().any(|to| self.can_be(to)),
            (CodeType::Union(sources), _) => sources.iter().all(|from| from.can_be(to)),
            _ => self.tag() == to.tag(),
        }
    }
}

impl Show for CodeType {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        match self {
            CodeType::List(subtype) => write!(f, "list({})", subtype.display(ctx)),
            CodeType::Function(FunctionType { args, ret }) => {
                write!(f, "function(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.ty.display(ctx))?;
                    if arg.expandable {
                        write!(f, "...")?;
                    }
                }
                let arrow = if args.is_empty() { "->" } else { " ->" };
                write!(f, "{arrow} {})", ret.display(ctx))
            }
            CodeType::Struct(name) => write!(f, "struct({})", ctx.ident_interner.get(name)),
            CodeType::Union(types) => {
                write!(f, "union(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty.display(ctx))?;
                }
                write!(f, ")")
            }
            ty => write!(f, "{}", ty.tag()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::util::intern::Interner;

    fn all_sample_types(posn: Interned<str>) -> Vec<CodeType> {
        vec![
            CodeType::Number,
            CodeType::String,
            CodeType::Boolean,
            CodeType::Symbol,
            CodeType::list(CodeType::Number),
            CodeType::function(vec![Arg::expandable(CodeType::Number)], CodeType::Number),
            CodeType::Struct(posn),
            CodeType::Any,
            CodeType::Flexible,
            CodeType::Void,
            CodeType::Union(vec![CodeType::String, CodeType::Number]),
            CodeType::Union(vec![
                CodeType::Union(vec![CodeType::Number, CodeType::Boolean]),
                CodeType::Number,
            ]),
        ]
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let mut i = Interner::with_capacity(4);
        for ty in all_sample_types(i.intern("posn")) {
            let once = ty.clone().collapse();
            assert_eq!(once.clone().collapse(), once, "{ty:?}");
        }
    }

    #[test]
    fn test_collapse() {
        use CodeType::*;
        let cases = [
            (Union(vec![Any, Number]), Any),
            (Union(vec![Number, Union(vec![String, Any])]), Any),
            (Union(vec![Number, Number]), Number),
            (Union(vec![String, Number]), Union(vec![String, Number])),
            (
                Union(vec![Union(vec![Number, Boolean]), Number, String]),
                Union(vec![Number, Boolean, String]),
            ),
            (
                Union(vec![CodeType::list(Number), CodeType::list(String)]),
                CodeType::list(Number),
            ),
            (Union(vec![]), Flexible),
            (CodeType::list(Union(vec![Number])), CodeType::list(Union(vec![Number]))),
        ];
        for (input, expected) in cases {
            assert_eq!(input.clone().collapse(), expected, "{input:?}");
        }
    }

    #[test]
    fn test_collapse_structs_by_tag() {
        let mut i = Interner::with_capacity(4);
        let posn = CodeType::Struct(i.intern("posn"));
        let rect = CodeType::Struct(i.intern("rect"));
        assert_eq!(CodeType::union(vec![posn.clone(), rect]), posn);
    }

    #[test]
    fn test_can_be_reflexive() {
        let mut i = Interner::with_capacity(4);
        for ty in all_sample_types(i.intern("posn")) {
            if !matches!(ty, CodeType::Union(_)) {
                assert!(ty.can_be(&ty), "{ty:?}");
            }
            assert!(CodeType::Flexible.can_be(&ty), "{ty:?}");
            assert!(ty.can_be(&CodeType::Any), "{ty:?}");
        }
    }

    #[test]
    fn test_can_be() {
        use CodeType::*;
        let mut i = Interner::with_capacity(4);
        let posn = Struct(i.intern("posn"));
        let rect = Struct(i.intern("rect"));

        assert!(Number.can_be(&Union(vec![String, Number])));
        assert!(!Boolean.can_be(&Union(vec![String, Number])));
        assert!(!Union(vec![String, Number]).can_be(&Number));
        // A union source is checked against each target member on its own.
        assert!(!Union(vec![String, Number]).can_be(&Union(vec![String, Number])));
        assert!(Union(vec![Flexible, Number]).can_be(&Number));
        assert!(!Any.can_be(&Number));
        assert!(!Number.can_be(&Flexible));
        assert!(CodeType::list(String).can_be(&CodeType::list(Number)));
        assert!(posn.can_be(&rect));
    }

    #[test]
    fn test_show() {
        let mut i = Interner::with_capacity(4);
        let posn = i.intern("posn");
        let ctx = Context { ident_interner: &i };
        let ty = CodeType::function(
            vec![
                Arg::fixed(CodeType::Struct(posn)),
                Arg::expandable(CodeType::list(CodeType::Any)),
            ],
            CodeType::Union(vec![CodeType::String, CodeType::Number]),
        );
        assert_eq!(
            ty.display(&ctx).to_string(),
            "function(struct(posn), list(any)... -> union(string, number))"
        );
    }
}
