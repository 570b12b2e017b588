use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Error, Ident, LitStr, Result, Token, Visibility, braced, token};

use proc_macro_crate::{FoundCrate, crate_name};

struct Node {
    name: Ident,
    /// Joined `///` lines, becomes the dev comment.
    comment: String,
    /// `#[redirect = "New.Name"]`
    redirect_to: Option<LitStr>,
    children: Vec<Node>,
}

struct NativeTagsInput {
    vis: Visibility,
    root: Ident,
    nodes: Vec<Node>,
}

impl Parse for NativeTagsInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let root: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let nodes = parse_nodes(&content)?;
        Ok(Self { vis, root, nodes })
    }
}

fn parse_nodes(input: ParseStream) -> Result<Vec<Node>> {
    let mut nodes: Vec<Node> = Vec::new();
    while !input.is_empty() {
        let (comment, redirect_to) = parse_attrs(input)?;
        let name: Ident = input.parse()?;

        if nodes.iter().any(|n| n.name == name) {
            return Err(Error::new(
                name.span(),
                format!("tag `{name}` is declared twice under the same parent"),
            ));
        }

        let children = if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            parse_nodes(&content)?
        } else {
            input.parse::<Token![;]>()?;
            Vec::new()
        };

        if redirect_to.is_some() && !children.is_empty() {
            return Err(Error::new(
                name.span(),
                format!("`{name}` has #[redirect] and children; redirects must be leaves"),
            ));
        }

        nodes.push(Node {
            name,
            comment,
            redirect_to,
            children,
        });
    }
    Ok(nodes)
}

/// Parse the attributes in front of a node.
///
/// Handles:
/// - `/// text` (arrives as `#[doc = "..."]`)
/// - `#[redirect = "Path.To.Target"]`
fn parse_attrs(input: ParseStream) -> Result<(String, Option<LitStr>)> {
    let mut doc_lines = Vec::new();
    let mut redirect_to = None;

    while input.peek(Token![#]) {
        input.parse::<Token![#]>()?;
        let content;
        syn::bracketed!(content in input);

        let key: Ident = content.parse()?;
        content.parse::<Token![=]>()?;
        let value: LitStr = content.parse()?;

        if key == "doc" {
            doc_lines.push(value.value().trim().to_owned());
        } else if key == "redirect" {
            redirect_to = Some(value);
        } else {
            return Err(Error::new(
                key.span(),
                format!("unsupported attribute `{key}`, expected doc comments or #[redirect]"),
            ));
        }
    }

    let comment = doc_lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok((comment, redirect_to))
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn tags_crate_path() -> TokenStream2 {
    match crate_name("gameplay-tags") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) | Err(_) => quote!(::gameplay_tags),
    }
}

// =============================================================================
// Code generation
// =============================================================================

fn join_path(prefix: &str, name: &Ident) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Collect the flat `ROWS` and `REDIRECTS` tables, parents before children.
fn collect_defs(
    nodes: &[Node],
    prefix: &str,
    krate: &TokenStream2,
    rows: &mut Vec<TokenStream2>,
    redirects: &mut Vec<TokenStream2>,
) {
    for node in nodes {
        let path = join_path(prefix, &node.name);
        let path_lit = LitStr::new(&path, Span::call_site());

        if let Some(target) = &node.redirect_to {
            redirects.push(quote! {
                #krate::NativeRedirectDef::new(#path_lit, #target),
            });
            continue;
        }

        let comment = LitStr::new(&node.comment, Span::call_site());
        rows.push(quote! {
            #krate::NativeTagDef::new(#path_lit, #comment),
        });

        collect_defs(&node.children, &path, krate, rows, redirects);
    }
}

/// One module per node, nested like the tag tree.
///
/// ```ignore
/// native_tags! {
///     pub mod Tags {
///         /// Crowd control.
///         State {
///             Stunned;
///         }
///         #[redirect = "State.Stunned"]
///         Dazed;
///     }
/// }
///
/// // Generates:
/// pub mod Tags {
///     pub const ROWS: &[NativeTagDef] = &[
///         NativeTagDef::new("State", "Crowd control."),
///         NativeTagDef::new("State.Stunned", ""),
///     ];
///     pub const REDIRECTS: &[NativeRedirectDef] = &[
///         NativeRedirectDef::new("Dazed", "State.Stunned"),
///     ];
///     pub const NODE_COUNT: usize = 2;
///
///     pub mod State {
///         pub const PATH: &str = "State";
///         pub const DEPTH: u8 = 0;
///         pub mod Stunned { ... }
///     }
///     pub mod Dazed {
///         pub const OLD_PATH: &str = "Dazed";
///         pub const PATH: &str = "State.Stunned";
///     }
/// }
/// ```
fn generate_modules(nodes: &[Node], prefix: &str, depth: u8) -> Vec<TokenStream2> {
    let mut output = Vec::new();

    for node in nodes {
        let ident = &node.name;
        let path = join_path(prefix, ident);
        let path_lit = LitStr::new(&path, Span::call_site());

        if let Some(target) = &node.redirect_to {
            output.push(quote! {
                #[allow(non_snake_case)]
                pub mod #ident {
                    /// Name this tag was declared under.
                    pub const OLD_PATH: &'static str = #path_lit;
                    /// Name the dictionary resolves it to (empty when retired).
                    pub const PATH: &'static str = #target;
                }
            });
            continue;
        }

        let doc = (!node.comment.is_empty()).then(|| {
            let comment = LitStr::new(&node.comment, Span::call_site());
            quote!(#[doc = #comment])
        });
        let children = generate_modules(&node.children, &path, depth + 1);

        output.push(quote! {
            #doc
            #[allow(non_snake_case)]
            pub mod #ident {
                /// Complete dotted name.
                pub const PATH: &'static str = #path_lit;
                /// Depth in the tag tree (0 = top-level).
                pub const DEPTH: u8 = #depth;

                #(#children)*
            }
        });
    }

    output
}

fn expand(input: &NativeTagsInput, krate: &TokenStream2) -> TokenStream2 {
    let mut rows = Vec::new();
    let mut redirects = Vec::new();
    collect_defs(&input.nodes, "", krate, &mut rows, &mut redirects);

    let node_count = rows.len();
    let modules = generate_modules(&input.nodes, "", 0);
    let vis = &input.vis;
    let root = &input.root;

    quote! {
        #[allow(non_snake_case)]
        #vis mod #root {
            /// Every declared tag with its dev comment, parents first.
            pub const ROWS: &'static [#krate::NativeTagDef] = &[
                #(#rows)*
            ];

            /// Renames declared with `#[redirect]`.
            pub const REDIRECTS: &'static [#krate::NativeRedirectDef] = &[
                #(#redirects)*
            ];

            /// Number of entries in `ROWS`.
            pub const NODE_COUNT: usize = #node_count;

            #(#modules)*
        }
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Declare native tags at compile time.
///
/// Every node (branches included) becomes a row in `ROWS`; doc comments
/// become dev comments. Leaves marked `#[redirect = "New.Name"]` go to
/// `REDIRECTS` instead. Feed both to
/// `TagSources::with_native_tags` / `with_native_redirects`.
#[proc_macro]
pub fn native_tags(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as NativeTagsInput);
    expand(&input, &tags_crate_path()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expand_str(src: &str) -> String {
        let input: NativeTagsInput = syn::parse_str(src).unwrap();
        expand(&input, &quote!(::gameplay_tags)).to_string()
    }

    fn parse_err(src: &str) -> String {
        match syn::parse_str::<NativeTagsInput>(src) {
            Ok(_) => panic!("expected a parse error"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn rows_include_branches_and_leaves_in_order() {
        let input: NativeTagsInput = syn::parse_str(
            "pub mod Tags {
                State { Stunned; Rooted; }
                Weapon;
            }",
        )
        .unwrap();

        let mut rows = Vec::new();
        let mut redirects = Vec::new();
        collect_defs(&input.nodes, "", &quote!(::gameplay_tags), &mut rows, &mut redirects);

        let names: Vec<String> = rows.iter().map(|row| row.to_string()).collect();
        assert_eq!(names.len(), 4);
        assert!(names[0].contains("\"State\""));
        assert!(names[1].contains("\"State.Stunned\""));
        assert!(names[2].contains("\"State.Rooted\""));
        assert!(names[3].contains("\"Weapon\""));
        assert!(redirects.is_empty());
    }

    #[test]
    fn doc_comments_become_dev_comments() {
        let code = expand_str(
            "pub mod Tags {
                /// Crowd control
                /// effects.
                State { Stunned; }
            }",
        );
        assert!(code.contains("\"Crowd control effects.\""));
    }

    #[test]
    fn redirects_are_not_rows() {
        let code = expand_str(
            "pub mod Tags {
                State { Rooted; #[redirect = \"State.Rooted\"] Frozen; }
            }",
        );
        assert!(code.contains("NativeRedirectDef :: new (\"State.Frozen\" , \"State.Rooted\")"));
        assert!(!code.contains("NativeTagDef :: new (\"State.Frozen\""));
        assert!(code.contains("pub const NODE_COUNT : usize = 2usize"));
        assert!(code.contains("OLD_PATH"));
    }

    /// Same-named children under different parents get distinct modules.
    #[test]
    fn same_name_different_parents_no_conflict() {
        let code = expand_str(
            "pub mod Tags {
                Combat { Attack; }
                Movement { Attack; }
            }",
        );
        assert!(code.contains("\"Combat.Attack\""));
        assert!(code.contains("\"Movement.Attack\""));
        assert!(!code.contains("pub use"));
    }

    #[test]
    fn depth_follows_nesting() {
        let input: NativeTagsInput = syn::parse_str("mod T { A { B { C; } } }").unwrap();
        let code = generate_modules(&input.nodes, "", 0)
            .into_iter()
            .map(|m| m.to_string())
            .collect::<String>();
        assert!(code.contains("DEPTH : u8 = 0u8"));
        assert!(code.contains("DEPTH : u8 = 2u8"));
    }

    #[test]
    fn redirect_with_children_is_rejected() {
        let err = parse_err("mod T { #[redirect = \"B\"] A { C; } B; }");
        assert!(err.contains("redirects must be leaves"));
    }

    #[test]
    fn duplicate_sibling_is_rejected() {
        let err = parse_err("mod T { A; A; }");
        assert_eq!(err, "tag `A` is declared twice under the same parent");
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = parse_err("mod T { #[color = \"red\"] A; }");
        assert!(err.contains("unsupported attribute `color`"));
    }
}
