//! SDL rendering of type system documents.

use std::fmt::{self, Display, Write};

use async_graphql_parser::{
    types::{self as ast, TypeKind, TypeSystemDefinition},
    Positioned,
};

use crate::directive_location_name;

const INDENT: &str = "  ";

/// Renders a type system document as SDL, definitions separated by a blank line.
pub fn print_document(document: &ast::ServiceDocument) -> String {
    let mut sdl = String::new();

    // Writing into a String cannot fail.
    match write_document(&mut sdl, document) {
        Ok(()) => sdl,
        Err(_) => String::new(),
    }
}

fn write_document(sdl: &mut String, document: &ast::ServiceDocument) -> fmt::Result {
    for (i, definition) in document.definitions.iter().enumerate() {
        if i > 0 {
            sdl.write_char('\n')?;
        }

        match definition {
            TypeSystemDefinition::Schema(schema) => write_schema(sdl, &schema.node)?,
            TypeSystemDefinition::Type(ty) => write_type(sdl, &ty.node)?,
            TypeSystemDefinition::Directive(directive) => write_directive_definition(sdl, &directive.node)?,
        }
    }

    Ok(())
}

fn write_schema(sdl: &mut String, schema: &ast::SchemaDefinition) -> fmt::Result {
    if schema.extend {
        sdl.write_str("extend ")?;
    }
    sdl.write_str("schema")?;
    write_directives(sdl, &schema.directives)?;

    let roots = [
        ("query", &schema.query),
        ("mutation", &schema.mutation),
        ("subscription", &schema.subscription),
    ];

    if roots.iter().all(|(_, root)| root.is_none()) {
        return sdl.write_char('\n');
    }

    sdl.write_str(" {\n")?;
    for (operation, root) in roots {
        if let Some(root) = root {
            writeln!(sdl, "{INDENT}{operation}: {}", root.node)?;
        }
    }
    sdl.write_str("}\n")
}

fn write_type(sdl: &mut String, ty: &ast::TypeDefinition) -> fmt::Result {
    write_description(sdl, ty.description.as_ref(), "")?;

    if ty.extend {
        sdl.write_str("extend ")?;
    }

    let name = &ty.name.node;

    match &ty.kind {
        TypeKind::Scalar => {
            write!(sdl, "scalar {name}")?;
            write_directives(sdl, &ty.directives)?;
            sdl.write_char('\n')
        }
        TypeKind::Object(object) => {
            write!(sdl, "type {name}")?;
            write_implements(sdl, &object.implements)?;
            write_directives(sdl, &ty.directives)?;
            write_fields(sdl, &object.fields)
        }
        TypeKind::Interface(interface) => {
            write!(sdl, "interface {name}")?;
            write_implements(sdl, &interface.implements)?;
            write_directives(sdl, &ty.directives)?;
            write_fields(sdl, &interface.fields)
        }
        TypeKind::Union(union) => {
            write!(sdl, "union {name}")?;
            write_directives(sdl, &ty.directives)?;

            for (i, member) in union.members.iter().enumerate() {
                sdl.write_str(if i == 0 { " = " } else { " | " })?;
                sdl.write_str(&member.node)?;
            }

            sdl.write_char('\n')
        }
        TypeKind::Enum(enum_type) => {
            write!(sdl, "enum {name}")?;
            write_directives(sdl, &ty.directives)?;

            if enum_type.values.is_empty() {
                return sdl.write_char('\n');
            }

            sdl.write_str(" {\n")?;
            for value in &enum_type.values {
                write_description(sdl, value.node.description.as_ref(), INDENT)?;
                write!(sdl, "{INDENT}{}", value.node.value.node)?;
                write_directives(sdl, &value.node.directives)?;
                sdl.write_char('\n')?;
            }
            sdl.write_str("}\n")
        }
        TypeKind::InputObject(input) => {
            write!(sdl, "input {name}")?;
            write_directives(sdl, &ty.directives)?;

            if input.fields.is_empty() {
                return sdl.write_char('\n');
            }

            sdl.write_str(" {\n")?;
            for field in &input.fields {
                write_description(sdl, field.node.description.as_ref(), INDENT)?;
                sdl.write_str(INDENT)?;
                write_input_value(sdl, &field.node)?;
                sdl.write_char('\n')?;
            }
            sdl.write_str("}\n")
        }
    }
}

fn write_implements(sdl: &mut String, interfaces: &[Positioned<async_graphql_value::Name>]) -> fmt::Result {
    for (i, interface) in interfaces.iter().enumerate() {
        sdl.write_str(if i == 0 { " implements " } else { " & " })?;
        sdl.write_str(&interface.node)?;
    }

    Ok(())
}

fn write_fields(sdl: &mut String, fields: &[Positioned<ast::FieldDefinition>]) -> fmt::Result {
    if fields.is_empty() {
        return sdl.write_char('\n');
    }

    sdl.write_str(" {\n")?;

    for field in fields {
        let field = &field.node;
        write_description(sdl, field.description.as_ref(), INDENT)?;
        write!(sdl, "{INDENT}{}", field.name.node)?;
        write_arguments_definition(sdl, &field.arguments, INDENT)?;
        write!(sdl, ": {}", field.ty.node)?;
        write_directives(sdl, &field.directives)?;
        sdl.write_char('\n')?;
    }

    sdl.write_str("}\n")
}

fn write_arguments_definition(
    sdl: &mut String,
    arguments: &[Positioned<ast::InputValueDefinition>],
    indentation: &str,
) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }

    if arguments.iter().all(|argument| argument.node.description.is_none()) {
        sdl.write_char('(')?;
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                sdl.write_str(", ")?;
            }
            write_input_value(sdl, &argument.node)?;
        }
        return sdl.write_char(')');
    }

    let nested = format!("{indentation}{INDENT}");

    sdl.write_str("(\n")?;
    for argument in arguments {
        write_description(sdl, argument.node.description.as_ref(), &nested)?;
        sdl.write_str(&nested)?;
        write_input_value(sdl, &argument.node)?;
        sdl.write_char('\n')?;
    }
    write!(sdl, "{indentation})")
}

fn write_input_value(sdl: &mut String, value: &ast::InputValueDefinition) -> fmt::Result {
    write!(sdl, "{}: {}", value.name.node, value.ty.node)?;

    if let Some(default_value) = &value.default_value {
        write!(sdl, " = {}", default_value.node)?;
    }

    write_directives(sdl, &value.directives)
}

fn write_directive_definition(sdl: &mut String, directive: &ast::DirectiveDefinition) -> fmt::Result {
    write_description(sdl, directive.description.as_ref(), "")?;
    write!(sdl, "directive @{}", directive.name.node)?;
    write_arguments_definition(sdl, &directive.arguments, "")?;

    if directive.is_repeatable {
        sdl.write_str(" repeatable")?;
    }

    for (i, location) in directive.locations.iter().enumerate() {
        sdl.write_str(if i == 0 { " on " } else { " | " })?;
        sdl.write_str(&directive_location_name(&location.node))?;
    }

    sdl.write_char('\n')
}

fn write_directives(sdl: &mut String, directives: &[Positioned<ast::ConstDirective>]) -> fmt::Result {
    for directive in directives {
        write!(sdl, " {}", DirectiveDisplay(&directive.node))?;
    }

    Ok(())
}

struct DirectiveDisplay<'a>(&'a ast::ConstDirective);

impl Display for DirectiveDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DirectiveDisplay(directive) = self;

        write!(f, "@{}", directive.name.node)?;

        if directive.arguments.is_empty() {
            return Ok(());
        }

        f.write_char('(')?;

        let mut arguments = directive.arguments.iter().peekable();
        while let Some((name, value)) = arguments.next() {
            write!(f, "{}: {}", name.node, value.node)?;
            if arguments.peek().is_some() {
                f.write_str(", ")?;
            }
        }

        f.write_char(')')
    }
}

fn write_description(sdl: &mut String, description: Option<&Positioned<String>>, indentation: &str) -> fmt::Result {
    let Some(description) = description else {
        return Ok(());
    };

    let description = description.node.replace("\"\"\"", "\\\"\"\"");

    if description.contains('\n') {
        writeln!(sdl, r#"{indentation}""""#)?;
        for line in description.lines() {
            if line.is_empty() {
                sdl.write_char('\n')?;
            } else {
                writeln!(sdl, "{indentation}{line}")?;
            }
        }
        writeln!(sdl, r#"{indentation}""""#)
    } else {
        writeln!(sdl, r#"{indentation}"""{description}""""#)
    }
}
