//! Análisis semántico.
//!
//! No existe un árbol sintáctico: las verificaciones estáticas ocurren
//! mientras el parser avanza. [`Scope`] registra las variables
//! introducidas, las etiquetas declaradas y los destinos de `GOTO`.
//! El uso antes de asignación y las etiquetas duplicadas se detectan
//! de inmediato; los `GOTO` hacia etiquetas inexistentes solo pueden
//! detectarse al final del programa, ya que los saltos hacia adelante
//! son legales.

use thiserror::Error;

use std::{
    collections::HashSet,
    fmt::{self, Display},
    rc::Rc,
};

use crate::source::Located;

/// Palabras reservadas de C y macros de `<stdio.h>`, inválidas para
/// cualquier nombre.
const RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "EOF", "NULL", "BUFSIZ", "FILENAME_MAX",
    "FOPEN_MAX", "TMP_MAX", "L_tmpnam", "SEEK_SET", "SEEK_CUR", "SEEK_END", "stdin", "stdout",
    "stderr",
];

/// Funciones que usa el prólogo. Las etiquetas viven en otro espacio
/// de nombres, así que solo las variables colisionan con estas.
const PROLOGUE: &[&str] = &["main", "printf", "scanf"];

/// Un identificador.
///
/// Los identificadores nombran tanto variables como etiquetas, las
/// cuales viven en espacios de nombres separados.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<str>);

impl From<Rc<str>> for Identifier {
    fn from(name: Rc<str>) -> Self {
        Identifier(name)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

pub type Semantic<T> = Result<T, Located<SemanticError>>;

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Referencing variable before assignment: {0}")]
    Undefined(Identifier),

    #[error("Label already exists: {0}")]
    DuplicateLabel(Identifier),

    #[error("Attempting to GOTO to undeclared label: {0}")]
    DanglingGoto(Identifier),

    #[error("Name is reserved in generated code: {0}")]
    Reserved(Identifier),
}

/// Tabla de símbolos y etiquetas de un programa.
#[derive(Default)]
pub struct Scope {
    symbols: HashSet<Identifier>,
    labels_declared: HashSet<Identifier>,
    labels_gotoed: Vec<Located<Identifier>>,
}

impl Scope {
    /// Introduce una variable por `LET` o `INPUT`.
    ///
    /// Retorna `true` si es la primera vez que se observa, en cuyo
    /// caso el llamador debe declararla.
    pub fn introduce(&mut self, id: &Located<Identifier>) -> Semantic<bool> {
        check_reserved(id, &[RESERVED, PROLOGUE])?;
        Ok(self.symbols.insert(id.val().clone()))
    }

    /// Verifica que una variable haya sido asignada antes de leerse.
    pub fn read(&self, id: &Located<Identifier>) -> Semantic<()> {
        if self.symbols.contains(id.val()) {
            Ok(())
        } else {
            Err(Located::at(
                SemanticError::Undefined(id.val().clone()),
                id.location().clone(),
            ))
        }
    }

    /// Declara una etiqueta, la cual no debe existir previamente.
    pub fn declare_label(&mut self, id: &Located<Identifier>) -> Semantic<()> {
        check_reserved(id, &[RESERVED])?;

        if self.labels_declared.insert(id.val().clone()) {
            Ok(())
        } else {
            Err(Located::at(
                SemanticError::DuplicateLabel(id.val().clone()),
                id.location().clone(),
            ))
        }
    }

    /// Registra un salto hacia una etiqueta, declarada o no.
    pub fn goto(&mut self, id: Located<Identifier>) -> Semantic<()> {
        check_reserved(&id, &[RESERVED])?;
        self.labels_gotoed.push(id);

        Ok(())
    }

    /// Verifica que todo `GOTO` tenga una etiqueta de destino.
    ///
    /// El error reportado corresponde al primer salto inválido en
    /// orden de aparición.
    pub fn finish(self) -> Semantic<()> {
        let labels_declared = &self.labels_declared;
        match self
            .labels_gotoed
            .into_iter()
            .find(|id| !labels_declared.contains(id.val()))
        {
            None => Ok(()),
            Some(id) => {
                let (location, id) = id.split();
                Err(Located::at(SemanticError::DanglingGoto(id), location))
            }
        }
    }
}

fn check_reserved(id: &Located<Identifier>, tables: &[&[&str]]) -> Semantic<()> {
    let name: &str = id.val().as_ref();
    if tables.iter().any(|table| table.contains(&name)) {
        Err(Located::at(
            SemanticError::Reserved(id.val().clone()),
            id.location().clone(),
        ))
    } else {
        Ok(())
    }
}
