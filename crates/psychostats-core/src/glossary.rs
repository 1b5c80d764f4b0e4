//! Reference card of spreadsheet functions used in psychology research.

use std::fmt;

use serde::Serialize;

/// Function family shown as a tag in the glossary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionCategory {
    /// Descriptive and inferential statistics.
    #[serde(rename = "Estadística")]
    Statistics,
    /// Conditionals.
    #[serde(rename = "Lógica")]
    Logic,
    /// Lookups across tables.
    #[serde(rename = "Búsqueda")]
    Lookup,
    /// Text and arithmetic helpers.
    #[serde(rename = "Matemática")]
    Math,
}

impl FunctionCategory {
    /// Spanish display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Statistics => "Estadística",
            Self::Logic => "Lógica",
            Self::Lookup => "Búsqueda",
            Self::Math => "Matemática",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A spreadsheet function with a psychology use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcelFunction {
    /// Spanish function name.
    pub name: &'static str,
    /// Call syntax with `;` separators.
    pub syntax: &'static str,
    /// What the function computes.
    pub description: &'static str,
    /// Family tag.
    pub category: FunctionCategory,
    /// A research scenario where it is useful.
    pub psych_example: &'static str,
}

impl ExcelFunction {
    fn matches(&self, needle: &str) -> bool {
        [self.name, self.description, self.psych_example]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

static GLOSSARY: [ExcelFunction; 9] = [
    ExcelFunction {
        name: "PROMEDIO",
        syntax: "=PROMEDIO(número1; [número2]; ...)",
        description: "Calcula la media aritmética de los argumentos.",
        category: FunctionCategory::Statistics,
        psych_example: "Calcular el puntaje promedio de satisfacción vital de un grupo de pacientes.",
    },
    ExcelFunction {
        name: "DESVEST.M",
        syntax: "=DESVEST.M(número1; [número2]; ...)",
        description: "Calcula la desviación estándar basada en una muestra (no la población total).",
        category: FunctionCategory::Statistics,
        psych_example: "Ver qué tan dispersos están los tiempos de respuesta en una tarea cognitiva.",
    },
    ExcelFunction {
        name: "MEDIANA",
        syntax: "=MEDIANA(número1; [número2]; ...)",
        description: "Devuelve el número central de un conjunto de números.",
        category: FunctionCategory::Statistics,
        psych_example: "Encontrar el ingreso típico en una encuesta socioeconómica (menos sensible a valores extremos que el promedio).",
    },
    ExcelFunction {
        name: "COEF.DE.CORREL",
        syntax: "=COEF.DE.CORREL(matriz1; matriz2)",
        description: "Devuelve el coeficiente de correlación de Pearson (r) entre dos rangos.",
        category: FunctionCategory::Statistics,
        psych_example: "Calcular si existe relación entre \"Horas de sueño\" y \"Errores en test de atención\".",
    },
    ExcelFunction {
        name: "SI",
        syntax: "=SI(prueba_lógica; valor_si_verdadero; valor_si_falso)",
        description: "Comprueba si se cumple una condición y devuelve un valor si es VERDADERO y otro si es FALSO.",
        category: FunctionCategory::Logic,
        psych_example: "Etiquetar participantes: =SI(B2>=18; \"Adulto\"; \"Menor\").",
    },
    ExcelFunction {
        name: "CONTAR.SI",
        syntax: "=CONTAR.SI(rango; criterio)",
        description: "Cuenta las celdas en el rango que coinciden con la condición dada.",
        category: FunctionCategory::Statistics,
        psych_example: "Contar cuántos participantes marcaron \"Totalmente de acuerdo\" en una pregunta.",
    },
    ExcelFunction {
        name: "BUSCARV",
        syntax: "=BUSCARV(valor_buscado; matriz_tabla; ind_columna; [rango])",
        description: "Busca un valor en la primera columna de una tabla y devuelve un valor en la misma fila.",
        category: FunctionCategory::Lookup,
        psych_example: "Unir dos bases de datos: Buscar el ID del paciente en una tabla maestra para traer su Diagnóstico.",
    },
    ExcelFunction {
        name: "CONCAT",
        syntax: "=CONCAT(texto1; [texto2]; ...)",
        description: "Combina el texto de varios rangos o cadenas.",
        category: FunctionCategory::Math,
        psych_example: "Crear un código único de sujeto uniendo iniciales y fecha de nacimiento.",
    },
    ExcelFunction {
        name: "PRUEBA.T.N",
        syntax: "=PRUEBA.T.N(matriz1; matriz2; colas; tipo)",
        description: "Devuelve la probabilidad asociada a una prueba t de Student.",
        category: FunctionCategory::Statistics,
        psych_example: "Calcular el p-valor para ver si hay diferencia significativa entre Grupo Control y Experimental.",
    },
];

/// Every glossary entry.
#[must_use]
pub fn glossary() -> &'static [ExcelFunction] {
    &GLOSSARY
}

/// Entries whose name, description or example contains `term`, ignoring
/// case. A blank term returns everything.
#[must_use]
pub fn search_glossary(term: &str) -> Vec<&'static ExcelFunction> {
    let needle = term.trim().to_lowercase();
    GLOSSARY
        .iter()
        .filter(|function| needle.is_empty() || function.matches(&needle))
        .collect()
}
