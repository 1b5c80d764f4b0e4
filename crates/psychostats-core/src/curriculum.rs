//! The fixed lesson curriculum.

use std::fmt;

use serde::Serialize;

use crate::error::{PsychoError, Result};

/// Advice shown next to every lesson.
pub const RESEARCH_TIP: &str = "Mantén siempre una copia de tus datos 'crudos' (raw data) en una hoja separada antes de empezar a limpiar o calcular. Es tu seguro de vida.";

/// Curriculum module a lesson belongs to, in teaching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleLevel {
    /// Interface and data entry.
    Basics,
    /// Variable types and cleaning.
    Formatting,
    /// Formulas, references and conditionals.
    Formulas,
    /// Descriptive statistics, correlation, pivot tables.
    Analysis,
    /// Charts.
    Visualization,
}

impl ModuleLevel {
    /// All levels in teaching order.
    pub const ALL: [Self; 5] = [
        Self::Basics,
        Self::Formatting,
        Self::Formulas,
        Self::Analysis,
        Self::Visualization,
    ];

    /// Spanish display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basics => "Fundamentos",
            Self::Formatting => "Datos y Formato",
            Self::Formulas => "Fórmulas y Lógica",
            Self::Analysis => "Análisis de Datos",
            Self::Visualization => "Visualización Científica",
        }
    }
}

impl fmt::Display for ModuleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One lesson of the curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonTopic {
    /// Identifier such as `"3.2"`.
    pub id: &'static str,
    /// Lesson title.
    pub title: &'static str,
    /// One-line summary for the navigator.
    pub description: &'static str,
    /// Module the lesson belongs to.
    pub level: ModuleLevel,
    /// Extra guidance given to the content generator.
    pub prompt_context: &'static str,
}

static CURRICULUM: [LessonTopic; 12] = [
    LessonTopic {
        id: "1.1",
        title: "El Laboratorio Digital (Interfaz)",
        description: "Entendiendo el entorno de trabajo: Celdas, Rangos y Libros.",
        level: ModuleLevel::Basics,
        prompt_context: "Explica la interfaz de Excel como si fuera un laboratorio. La hoja es tu mesa de trabajo. Celdas, Filas (Sujetos), Columnas (Variables).",
    },
    LessonTopic {
        id: "1.2",
        title: "Ingreso de Datos de Investigación",
        description: "Cómo digitar datos sin errores para evitar sesgos.",
        level: ModuleLevel::Basics,
        prompt_context: "Buenas prácticas al ingresar datos manuales de encuestas o tests. Errores comunes (espacios extra, mezclar texto y números). Importancia de un ID único por sujeto.",
    },
    LessonTopic {
        id: "2.1",
        title: "Tipos de Variables y Formato",
        description: "Distinguiendo Texto, Números, Fechas y Porcentajes.",
        level: ModuleLevel::Formatting,
        prompt_context: "Explica la diferencia entre formato de celda y valor real. Relaciona con tipos de variables en estadística: Nominales (Texto), Escalares (Números), Tiempo (Fechas).",
    },
    LessonTopic {
        id: "2.2",
        title: "Limpieza y Validación de Datos",
        description: "Asegurando la calidad de tus datos antes de analizar.",
        level: ModuleLevel::Formatting,
        prompt_context: "Uso de \"Validación de Datos\" para restringir entradas (ej. edad no puede ser negativa). Buscar y Reemplazar para corregir errores de tipeo en respuestas.",
    },
    LessonTopic {
        id: "3.1",
        title: "Sintaxis de Fórmulas y Operadores",
        description: "El lenguaje de Excel: Sumas, Restas y Paréntesis.",
        level: ModuleLevel::Formulas,
        prompt_context: "Cómo empezar una fórmula (=). Operadores básicos (+, -, *, /) para transformar puntajes brutos. El orden de las operaciones.",
    },
    LessonTopic {
        id: "3.2",
        title: "Referencias Relativas vs Absolutas ($)",
        description: "El concepto más importante para automatizar cálculos.",
        level: ModuleLevel::Formulas,
        prompt_context: "Explica el signo $ (Fijar celdas). Ejemplo: Calcular porcentaje de asistencia donde el total de clases es una celda fija para todos los alumnos.",
    },
    LessonTopic {
        id: "3.3",
        title: "Lógica Condicional (SI / IF)",
        description: "Tomando decisiones automáticas con tus datos.",
        level: ModuleLevel::Formulas,
        prompt_context: "La función SI (IF). Ejemplo: Crear una columna nueva que diga \"Clínico\" si el puntaje > 15 o \"Control\" si es menor.",
    },
    LessonTopic {
        id: "4.1",
        title: "Estadística Descriptiva Básica",
        description: "Promedios, Mediana y Desviación Estándar.",
        level: ModuleLevel::Analysis,
        prompt_context: "Las funciones PROMEDIO, MEDIANA, DESVEST.M, MAX, MIN. Analizando un set de datos de tiempos de reacción o puntajes de CI.",
    },
    LessonTopic {
        id: "4.2",
        title: "Correlaciones (Pearson)",
        description: "Analizando la relación entre dos variables.",
        level: ModuleLevel::Analysis,
        prompt_context: "Función COEF.DE.CORREL. Qué significa una correlación positiva o negativa en psicología (ej. Estrés vs Desempeño).",
    },
    LessonTopic {
        id: "4.3",
        title: "Tablas Dinámicas (Pivot Tables)",
        description: "Resumiendo grandes cantidades de datos en segundos.",
        level: ModuleLevel::Analysis,
        prompt_context: "Introducción a Tablas Dinámicas. Agrupar datos por categorías (Género, Grupo etario) y calcular promedios grupales.",
    },
    LessonTopic {
        id: "5.1",
        title: "Histogramas y Distribución",
        description: "Visualizando la normalidad de tus datos.",
        level: ModuleLevel::Visualization,
        prompt_context: "Cómo insertar un Histograma. Por qué es importante ver la \"Campana\" de distribución en variables psicológicas.",
    },
    LessonTopic {
        id: "5.2",
        title: "Gráficos de Dispersión y Barras",
        description: "Comunicando tus hallazgos visualmente.",
        level: ModuleLevel::Visualization,
        prompt_context: "Cuándo usar Dispersión (correlaciones) vs Barras (comparar grupos). Buenas prácticas APA para gráficos (títulos claros, ejes etiquetados).",
    },
];

/// All lessons in teaching order.
#[must_use]
pub fn curriculum() -> &'static [LessonTopic] {
    &CURRICULUM
}

/// The lesson shown when nothing has been selected yet.
#[must_use]
pub fn first_lesson() -> &'static LessonTopic {
    &CURRICULUM[0]
}

/// Looks up a lesson by identifier.
pub fn lesson(id: &str) -> Result<&'static LessonTopic> {
    let id = id.trim();
    CURRICULUM
        .iter()
        .find(|topic| topic.id == id)
        .ok_or_else(|| PsychoError::unknown_lesson(id))
}

/// Lessons of one module, in order.
pub fn lessons_in(level: ModuleLevel) -> impl Iterator<Item = &'static LessonTopic> {
    CURRICULUM.iter().filter(move |topic| topic.level == level)
}
