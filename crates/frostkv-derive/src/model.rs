use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Type};

const ATTR: &str = "frost";
const ID_BLOCK: &str = "DefaultData";

///
/// DeclaredField
///

struct DeclaredField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    options: Option<LitStr>,
}

impl DeclaredField<'_> {
    // `-` alone: the field is never stored, so its type needs no
    // `FieldValue` impl.
    fn is_excluded(&self) -> bool {
        self.options
            .as_ref()
            .is_some_and(|lit| lit.value().trim() == "-")
    }
}

// derive_model
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream, Error> {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Model can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Model can only be derived for structs with named fields",
        ));
    };

    let mut id_block: Option<&Ident> = None;
    let mut fields = Vec::new();
    for field in &named.named {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        if is_path_ident(&field.ty, ID_BLOCK) {
            if id_block.is_some() {
                return Err(Error::new_spanned(
                    field,
                    "Model allows only one DefaultData field",
                ));
            }
            id_block = Some(field_ident);
            continue;
        }

        fields.push(DeclaredField {
            ident: field_ident,
            ty: &field.ty,
            options: field_options(&field.attrs)?,
        });
    }

    let Some(id_block) = id_block else {
        return Err(Error::new_spanned(
            ident,
            "Model requires a DefaultData field to carry the record id",
        ));
    };

    let decls = fields.iter().map(|field| {
        let name = field.ident.to_string();
        let ty = field.ty;
        let options = match &field.options {
            Some(lit) => quote!(Some(#lit)),
            None => quote!(None),
        };
        let shape = if field.is_excluded() {
            quote!(::frostkv::model::field::FieldShape::Embedded)
        } else {
            quote!(<#ty as ::frostkv::traits::FieldValue>::shape())
        };

        quote! {
            ::frostkv::model::field::FieldDecl::new(#name, #options, #shape)
        }
    });

    let stored: Vec<&DeclaredField> = fields.iter().filter(|f| !f.is_excluded()).collect();

    let get_arms = stored.iter().map(|field| {
        let name = field.ident.to_string();
        let field_ident = field.ident;

        quote! {
            #name => ::frostkv::traits::FieldValue::to_value(&self.#field_ident),
        }
    });

    let set_arms = stored.iter().map(|field| {
        let name = field.ident.to_string();
        let field_ident = field.ident;
        let ty = field.ty;

        quote! {
            #name => match <#ty as ::frostkv::traits::FieldValue>::from_value(value) {
                Some(v) => {
                    self.#field_ident = v;
                    true
                }
                None => false,
            },
        }
    });

    Ok(quote! {
        impl #impl_generics ::frostkv::traits::Model for #ident #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;

            fn fields() -> Vec<::frostkv::model::field::FieldDecl> {
                vec![#(#decls),*]
            }

            fn id(&self) -> &str {
                &self.#id_block.id
            }

            fn set_id(&mut self, id: String) {
                self.#id_block.id = id;
            }

            fn get_value(
                &self,
                field: &str,
            ) -> Result<::frostkv::value::Value, ::frostkv::value::ValueError> {
                match field {
                    #(#get_arms)*
                    _ => Err(::frostkv::value::ValueError::UnknownField),
                }
            }

            fn set_value(&mut self, field: &str, value: &::frostkv::value::Value) -> bool {
                match field {
                    #(#set_arms)*
                    _ => false,
                }
            }
        }
    })
}

// Option string of one field; at most one `#[frost("...")]`.
fn field_options(attrs: &[Attribute]) -> Result<Option<LitStr>, Error> {
    let mut options = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
        if options.is_some() {
            return Err(Error::new_spanned(
                attr,
                "only one #[frost(\"...\")] attribute is allowed per field",
            ));
        }
        options = Some(attr.parse_args::<LitStr>()?);
    }

    Ok(options)
}

fn is_path_ident(ty: &Type, ident: &str) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == ident)
}
